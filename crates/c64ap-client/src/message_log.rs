//! Bounded on-screen message log

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    remaining: u32,
}

/// Recent messages, each shown for a fixed number of render calls
#[derive(Debug, Clone)]
pub struct MessageLog {
    lines: VecDeque<Line>,
    capacity: usize,
    display_frames: u32,
}

impl MessageLog {
    pub fn new(capacity: usize, display_frames: u32) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            display_frames,
        }
    }

    /// Add a line, evicting the oldest when full
    pub fn push(&mut self, text: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(Line {
            text: text.into(),
            remaining: self.display_frames,
        });
    }

    /// Lines to draw this frame, oldest first.
    ///
    /// Every call counts as one frame shown.
    pub fn render(&mut self) -> Vec<String> {
        let visible = self.lines.iter().map(|l| l.text.clone()).collect();
        for line in &mut self.lines {
            line.remaining = line.remaining.saturating_sub(1);
        }
        self.lines.retain(|l| l.remaining > 0);
        visible
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_expire_after_display_frames() {
        let mut log = MessageLog::new(4, 2);
        log.push("Theo sent you Spring");

        assert_eq!(log.render(), vec!["Theo sent you Spring"]);
        assert_eq!(log.render(), vec!["Theo sent you Spring"]);
        assert!(log.render().is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = MessageLog::new(2, 10);
        log.push("a");
        log.push("b");
        log.push("c");
        assert_eq!(log.render(), vec!["b", "c"]);
    }
}
