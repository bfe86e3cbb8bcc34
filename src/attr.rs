//! Sysfs-style attribute surface
//!
//! Components publish named attribute groups (one file-like entry per
//! tunable) through the [`AttrPublisher`] capability instead of touching any
//! concrete surface directly. The HTTP layer in `api` serves a registry;
//! tests substitute a mock.
//!
//! Contract notes:
//! - `show` is infallible and returns the full newline-terminated text.
//! - `store` is infallible as well: malformed input is the component's
//!   problem to log and ignore, mirroring a sysfs store that returns `count`
//!   regardless.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Attribute access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMode {
    /// Readable only; the publisher rejects writes before dispatch
    ReadOnly,
    /// Readable and writable
    ReadWrite,
}

type ShowFn = Arc<dyn Fn() -> String + Send + Sync>;
type StoreFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A single published tunable
///
/// Closures capture the owning component's shared state (`Arc` clones), so
/// an `Attr` stays valid for as long as the registry holds it.
#[derive(Clone)]
pub struct Attr {
    name: &'static str,
    mode: AttrMode,
    show: ShowFn,
    store: Option<StoreFn>,
}

impl Attr {
    /// Create a read-only attribute
    pub fn read_only<S>(name: &'static str, show: S) -> Self
    where
        S: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            name,
            mode: AttrMode::ReadOnly,
            show: Arc::new(show),
            store: None,
        }
    }

    /// Create a read-write attribute
    pub fn read_write<S, T>(name: &'static str, show: S, store: T) -> Self
    where
        S: Fn() -> String + Send + Sync + 'static,
        T: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            name,
            mode: AttrMode::ReadWrite,
            show: Arc::new(show),
            store: Some(Arc::new(store)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mode(&self) -> AttrMode {
        self.mode
    }

    /// Read the attribute. Never fails.
    pub fn show(&self) -> String {
        (self.show)()
    }

    /// Write raw text to the attribute.
    ///
    /// Returns false if the attribute is read-only (input not dispatched).
    /// A true return means the store ran, not that the input was valid.
    pub fn store(&self, input: &str) -> bool {
        match &self.store {
            Some(store) => {
                store(input);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attr")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish()
    }
}

/// A named collection of attributes, registered as a unit
#[derive(Debug, Clone)]
pub struct AttrGroup {
    name: &'static str,
    attrs: Vec<Attr>,
}

impl AttrGroup {
    pub fn new(name: &'static str, attrs: Vec<Attr>) -> Self {
        Self { name, attrs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Find an attribute by name within this group
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

/// Attribute publishing capability
///
/// Registration failure disables the registering component's surface but
/// must never take down the host.
pub trait AttrPublisher: Send + Sync {
    /// Publish a group. Fails if a group with the same name already exists.
    fn register(&self, group: AttrGroup) -> Result<()>;

    /// Remove a previously published group. Unknown names are ignored.
    fn unregister(&self, name: &str);
}

/// In-process attribute registry served by the HTTP layer
///
/// Uses a std RwLock: lookups are short, synchronous, and never held across
/// an await point (lookup clones the Attr out).
#[derive(Default)]
pub struct AttrRegistry {
    groups: RwLock<HashMap<&'static str, AttrGroup>>,
}

impl AttrRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single attribute, cloned out of the lock
    pub fn lookup(&self, group: &str, attr: &str) -> Option<Attr> {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        groups.get(group)?.attr(attr).cloned()
    }

    /// Snapshot of a group's attribute names and modes
    pub fn group_listing(&self, group: &str) -> Option<Vec<(&'static str, AttrMode)>> {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        let group = groups.get(group)?;
        Some(group.attrs().iter().map(|a| (a.name(), a.mode())).collect())
    }
}

impl AttrPublisher for AttrRegistry {
    fn register(&self, group: AttrGroup) -> Result<()> {
        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        if groups.contains_key(group.name()) {
            return Err(Error::AttrRegistration(format!(
                "attribute group '{}' already registered",
                group.name()
            )));
        }
        groups.insert(group.name(), group);
        Ok(())
    }

    fn unregister(&self, name: &str) {
        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        groups.remove(name);
    }
}
