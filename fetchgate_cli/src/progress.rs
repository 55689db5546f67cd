use indicatif::{ProgressBar, ProgressStyle};

/// A single 0-100 terminal bar fed from the pipelines' percentage
/// callbacks.
pub struct PercentBar {
    bar: ProgressBar,
}

impl PercentBar {
    pub fn new(label: &str) -> Self {
        let style = ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}%")
            .unwrap()
            .progress_chars("=>-");
        let bar = ProgressBar::new(100);
        bar.set_style(style);
        bar.set_message(label.to_string());
        Self { bar }
    }

    pub fn tick(&self, pct: u8) {
        self.bar.set_position(pct.min(100) as u64);
    }

    pub fn finish(&self) {
        self.bar.set_position(100);
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
