use crate::{AppState, CollectionPhase, FormValues};

/// What the collect button should render as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonMode {
    #[default]
    Collect,
    Collecting,
}

/// Snapshot of everything the panel renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelView {
    pub button: ButtonMode,
    pub status: String,
    pub addresses: Vec<String>,
    pub count: usize,
    pub form: FormValues,
}

impl AppState {
    pub fn view(&self) -> PanelView {
        let button = if self.phase().is_collecting() {
            ButtonMode::Collecting
        } else {
            ButtonMode::Collect
        };

        // Results stay visible only on the target that produced them; a
        // panel opened over some other target renders an empty list.
        let addresses = match self.phase() {
            CollectionPhase::Completed { target } if self.foreground() == Some(target) => {
                self.collected().to_vec()
            }
            _ => Vec::new(),
        };

        PanelView {
            button,
            status: self.status().to_string(),
            count: addresses.len(),
            addresses,
            form: self.form().clone(),
        }
    }
}
