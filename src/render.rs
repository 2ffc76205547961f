//! Consumers of step results. The optimizers never draw anything themselves.

use crate::error::TspResult;
use crate::graph::CityGraph;
use crate::optimizer::{StepEvent, StepResult};
use crate::utils::render_ascii;
use std::io::Write;

/// Receives every step result a controller produces.
pub trait Renderer {
    fn render(&mut self, graph: &CityGraph, result: &StepResult) -> TspResult<()>;
}

fn is_notable(result: &StepResult) -> bool {
    result.event == StepEvent::Improved || result.is_terminal
}

/// Logs improvements and the final result through the `log` facade.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, _graph: &CityGraph, result: &StepResult) -> TspResult<()> {
        if result.is_terminal {
            log::info!(
                "{}: finished at step {} with length {:.2} ({:?})",
                result.strategy,
                result.step_index,
                result.length,
                result.event
            );
        } else if result.event == StepEvent::Improved {
            log::info!(
                "{}: step {} new best length {:.2}",
                result.strategy,
                result.step_index,
                result.length
            );
        }
        Ok(())
    }
}

/// Writes step results as JSON lines.
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
    notable_only: bool,
}

impl<W: Write> JsonLinesRenderer<W> {
    /// With `notable_only`, only improvements and the terminal result are written.
    pub fn new(writer: W, notable_only: bool) -> Self {
        JsonLinesRenderer {
            writer,
            notable_only,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, _graph: &CityGraph, result: &StepResult) -> TspResult<()> {
        if self.notable_only && !is_notable(result) {
            return Ok(());
        }
        serde_json::to_writer(&mut self.writer, result)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Draws the best tour as a character grid whenever it improves.
pub struct AsciiRenderer<W: Write> {
    writer: W,
    width: usize,
    height: usize,
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(writer: W, width: usize, height: usize) -> Self {
        AsciiRenderer {
            writer,
            width,
            height,
        }
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    fn render(&mut self, graph: &CityGraph, result: &StepResult) -> TspResult<()> {
        if !is_notable(result) || result.tour.is_empty() {
            return Ok(());
        }
        writeln!(
            self.writer,
            "{} step {}: length {:.2}",
            result.strategy, result.step_index, result.length
        )?;
        let picture = render_ascii(graph, &result.tour, self.width, self.height)?;
        write!(self.writer, "{}", picture)?;
        self.writer.flush()?;
        Ok(())
    }
}
