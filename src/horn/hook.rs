use std::cell::RefCell;
use std::rc::Rc;

use super::error::HookError;

/// A notification point that accepts exactly one listener.
///
/// Registering over an existing listener is refused instead of silently
/// replacing it.
pub struct Hook<T> {
    name: &'static str,
    listener: RefCell<Option<Rc<dyn Fn(&T)>>>,
}

impl<T> Hook<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listener: RefCell::new(None),
        }
    }

    pub fn register(&self, listener: impl Fn(&T) + 'static) -> Result<(), HookError> {
        let mut slot = self.listener.borrow_mut();
        if slot.is_some() {
            return Err(HookError::AlreadyRegistered(self.name));
        }
        *slot = Some(Rc::new(listener));
        Ok(())
    }

    /// Invoke the listener, if any. Returns whether one was called.
    pub fn emit(&self, value: &T) -> bool {
        // Clone out first so the listener may re-enter this hook.
        let listener = self.listener.borrow().clone();
        match listener {
            Some(listener) => {
                listener(value);
                true
            }
            None => false,
        }
    }
}
