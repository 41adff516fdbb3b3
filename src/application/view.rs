//! View-post modal state.
//!
//! Pure UI state: which post, if any, is open in the detail modal. It is
//! deliberately outside the query cache; logout clears the cache but leaves
//! the modal alone, and closing the modal never touches cached data.

use std::sync::RwLock;

use tracing::debug;

use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "application::view";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open {
        post_id: i64,
    },
}

pub struct ViewPostModal {
    state: RwLock<ModalState>,
}

impl ViewPostModal {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(ModalState::Closed),
        }
    }

    /// Open the modal on a post. Opening while already open retargets it.
    pub fn open(&self, post_id: i64) {
        *rw_write(&self.state, SOURCE, "open") = ModalState::Open { post_id };
        debug!(post_id, "View-post modal opened");
    }

    /// Close the modal. Closing an already-closed modal is a no-op.
    pub fn close(&self) {
        *rw_write(&self.state, SOURCE, "close") = ModalState::Closed;
    }

    pub fn state(&self) -> ModalState {
        *rw_read(&self.state, SOURCE, "state")
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state(), ModalState::Open { .. })
    }

    pub fn selected_post_id(&self) -> Option<i64> {
        match self.state() {
            ModalState::Open { post_id } => Some(post_id),
            ModalState::Closed => None,
        }
    }
}
