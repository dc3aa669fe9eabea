use bingen_ports::scheduler::CancelHandle;
use parking_lot::Mutex;

/// Cancel handles for every job scheduled since the last [`VoiceRegistry::cancel_all`].
#[derive(Default)]
pub struct VoiceRegistry {
    handles: Mutex<Vec<Box<dyn CancelHandle>>>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: Box<dyn CancelHandle>) {
        self.handles.lock().push(handle);
    }

    pub fn register_all(&self, handles: impl IntoIterator<Item = Box<dyn CancelHandle>>) {
        self.handles.lock().extend(handles);
    }

    /// Cancels and forgets every handle. Returns how many were still live.
    pub fn cancel_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());
        let mut live = 0;
        for handle in handles {
            if !handle.is_cancelled() {
                live += 1;
            }
            handle.cancel();
        }
        live
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}
