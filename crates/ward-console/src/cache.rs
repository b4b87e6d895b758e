//! Bounded cache of the most recent console lines.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::types::LogLine;

/// Keeps the last `capacity` lines; older lines are evicted first.
#[derive(Debug)]
pub struct LogCache {
    lines: Mutex<VecDeque<LogLine>>,
    capacity: usize,
}

impl LogCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, line: LogLine) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lines.lock();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Cached lines, oldest first.
    pub fn snapshot(&self) -> Vec<LogLine> {
        self.lines.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let cache = LogCache::new(3);
        for i in 0..5 {
            cache.push(LogLine::stdout(format!("line {}", i)));
        }
        let texts: Vec<_> = cache.snapshot().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let cache = LogCache::new(0);
        cache.push(LogLine::stderr("dropped"));
        assert!(cache.is_empty());
    }
}
