//! The entry surface: generated UI controls as seen by the engine

use crate::enums::Action;
use crate::requirement::Requirement;
use crate::value::{Value, ValueType};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// A generated control. The engine reads its live value and installs the
/// resolved enable/display requirements through the two setter hooks.
///
/// Setters take `&self`: entries are shared and keep their own interior
/// state.
pub trait Entry {
    /// Current live value.
    fn value(&self) -> Value;

    /// Runtime type of the value.
    fn value_type(&self) -> ValueType;

    /// `None` clears any previous requirement.
    fn set_enable_requirement(&self, requirement: Option<Requirement>);

    /// `None` clears any previous requirement.
    fn set_display_requirement(&self, requirement: Option<Requirement>);
}

/// Shared handle to an entry, compared and hashed by identity.
#[derive(Clone)]
pub struct EntryHandle(Rc<dyn Entry>);

impl EntryHandle {
    pub fn new<E: Entry + 'static>(entry: Rc<E>) -> Self {
        EntryHandle(entry)
    }

    pub fn from_dyn(entry: Rc<dyn Entry>) -> Self {
        EntryHandle(entry)
    }

    pub fn value(&self) -> Value {
        self.0.value()
    }

    pub fn value_type(&self) -> ValueType {
        self.0.value_type()
    }

    /// Route `requirement` to the setter for `action`.
    pub fn install(&self, action: Action, requirement: Option<Requirement>) {
        match action {
            Action::Enable => self.0.set_enable_requirement(requirement),
            Action::Display => self.0.set_display_requirement(requirement),
        }
    }

    /// Non-owning handle for use inside installed requirements, so that
    /// entries referring to each other do not keep each other alive.
    pub fn downgrade(&self) -> WeakEntry {
        WeakEntry(Rc::downgrade(&self.0))
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for EntryHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for EntryHandle {}

impl Hash for EntryHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryHandle({:p})", self.addr())
    }
}

/// Weak counterpart of [`EntryHandle`].
#[derive(Clone)]
pub struct WeakEntry(Weak<dyn Entry>);

impl WeakEntry {
    pub fn upgrade(&self) -> Option<EntryHandle> {
        self.0.upgrade().map(EntryHandle)
    }
}

impl fmt::Debug for WeakEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakEntry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct Probe {
        value: RefCell<Value>,
        enable: RefCell<Option<Requirement>>,
        display: RefCell<Option<Requirement>>,
    }

    impl Probe {
        fn new(value: Value) -> Rc<Self> {
            Rc::new(Self {
                value: RefCell::new(value),
                enable: RefCell::new(None),
                display: RefCell::new(None),
            })
        }
    }

    impl Entry for Probe {
        fn value(&self) -> Value {
            self.value.borrow().clone()
        }

        fn value_type(&self) -> ValueType {
            ValueType::Bool
        }

        fn set_enable_requirement(&self, requirement: Option<Requirement>) {
            *self.enable.borrow_mut() = requirement;
        }

        fn set_display_requirement(&self, requirement: Option<Requirement>) {
            *self.display.borrow_mut() = requirement;
        }
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let a = Probe::new(Value::Bool(true));
        let b = Probe::new(Value::Bool(true));
        let ha = EntryHandle::new(Rc::clone(&a));
        let ha2 = EntryHandle::new(a);
        let hb = EntryHandle::new(b);
        assert_eq!(ha, ha2);
        assert_ne!(ha, hb);
        let set: HashSet<EntryHandle> = [ha, ha2, hb].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_install_routes_by_action() {
        let probe = Probe::new(Value::Bool(false));
        let handle = EntryHandle::new(Rc::clone(&probe));
        handle.install(Action::Display, Some(Requirement::constant(true)));
        assert!(probe.enable.borrow().is_none());
        assert!(probe.display.borrow().is_some());
        handle.install(Action::Display, None);
        assert!(probe.display.borrow().is_none());
    }

    #[test]
    fn test_weak_entry_releases() {
        let probe = Probe::new(Value::Bool(true));
        let handle = EntryHandle::new(probe);
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some());
        drop(handle);
        assert!(weak.upgrade().is_none());
    }
}
