use std::sync::Arc;

use pomodorino_core::{Database, KvStore, Result, Toast, ToastKind};

/// Open the on-disk store every command operates on.
pub fn open_store() -> Result<Arc<dyn KvStore>> {
    Ok(Arc::new(Database::open()?))
}

pub fn print_toast(toast: &Toast) {
    let tag = match toast.kind {
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
    };
    println!("[{tag}] {}: {}", toast.title, toast.message);
}
