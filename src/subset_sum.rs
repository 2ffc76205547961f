//! Dynamic-programming subset-sum solver.

/// Decides whether some subset of `items` sums to `target`, and reconstructs one.
#[derive(Debug, Clone)]
pub struct SubsetSumSolver {
    items: Vec<usize>,
    target: usize,
}

impl SubsetSumSolver {
    pub fn new(items: Vec<usize>, target: usize) -> Self {
        SubsetSumSolver { items, target }
    }

    /// Items (in their original order) summing to the target, or `None` when no subset does.
    ///
    /// Runs in `O(items * target)` time and memory.
    pub fn solve(&self) -> Option<Vec<usize>> {
        let table = self.build_table();

        if !table[self.items.len()][self.target] {
            log::debug!("subset_sum: no subset of {} items sums to {}", self.items.len(), self.target);
            return None;
        }

        Some(self.trace_back(&table))
    }

    /// `table[i][j]` is true when some subset of the first `i` items sums to `j`.
    fn build_table(&self) -> Vec<Vec<bool>> {
        let n = self.items.len();
        let mut table = vec![vec![false; self.target + 1]; n + 1];

        // The empty subset reaches zero.
        for row in table.iter_mut() {
            row[0] = true;
        }

        for i in 1..=n {
            let item = self.items[i - 1];
            for j in 1..=self.target {
                table[i][j] = table[i - 1][j] || (j >= item && table[i - 1][j - item]);
            }
        }

        table
    }

    fn trace_back(&self, table: &[Vec<bool>]) -> Vec<usize> {
        let mut chosen = Vec::new();
        let (mut i, mut j) = (self.items.len(), self.target);

        while i > 0 && j > 0 {
            // Item i-1 is needed exactly when the first i-1 items cannot reach j alone.
            if table[i][j] && !table[i - 1][j] {
                chosen.push(self.items[i - 1]);
                j -= self.items[i - 1];
            }
            i -= 1;
        }

        chosen.reverse();
        chosen
    }
}
