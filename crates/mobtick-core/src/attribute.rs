//! Synchronized attribute store
//!
//! Each entity kind declares a closed enum of attribute keys. A
//! [`SyncedStore`] holds one typed slot per key in a dense array indexed by the
//! key's ordinal. Writes are synchronous: a changed value marks its slot dirty,
//! records the key in the pending change set and runs every listener before
//! `set` returns.
//!
//! Dirty bits feed replication (`pack_dirty`); the change set feeds the owning
//! entity's own tick-boundary reactions (`take_changes`). The two are drained
//! independently.

use crate::error::{ConfigurationError, Error, Result};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Upper bound on keys per entity kind (one bit each in the change masks)
pub const MAX_ATTRIBUTES: usize = 64;

/// A closed set of attribute keys for one entity kind
///
/// Implement with [`attribute_keys!`](crate::attribute_keys) rather than by hand.
pub trait AttributeKey: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Number of keys in the set
    const COUNT: usize;

    /// Dense slot index, `0..COUNT`
    fn index(self) -> usize;

    fn from_index(index: usize) -> Option<Self>;

    /// Stable name used in diagnostics
    fn name(self) -> &'static str;
}

/// Declare a key enum and its [`AttributeKey`] impl
///
/// ```
/// mobtick_core::attribute_keys! {
///     pub enum CloudKey {
///         Radius => "Radius",
///         Waiting => "Waiting",
///     }
/// }
/// use mobtick_core::AttributeKey;
/// assert_eq!(CloudKey::COUNT, 2);
/// assert_eq!(CloudKey::from_index(1), Some(CloudKey::Waiting));
/// ```
#[macro_export]
macro_rules! attribute_keys {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::AttributeKey for $name {
            const COUNT: usize = [$($label),+].len();

            fn index(self) -> usize {
                self as usize
            }

            fn from_index(index: usize) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$variant),+];
                ALL.get(index).copied()
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Byte(i8),
    Int(i32),
    Float(f32),
    Vector(Vec3),
    Rotation(Quat),
    Text(String),
}

impl AttrValue {
    /// Type name, used for type checks and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Byte(_) => "byte",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Vector(_) => "vector",
            AttrValue::Rotation(_) => "rotation",
            AttrValue::Text(_) => "text",
        }
    }

    fn same_type(&self, other: &AttrValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i8> for AttrValue {
    fn from(v: i8) -> Self {
        AttrValue::Byte(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Float(v)
    }
}

impl From<Vec3> for AttrValue {
    fn from(v: Vec3) -> Self {
        AttrValue::Vector(v)
    }
}

impl From<Quat> for AttrValue {
    fn from(v: Quat) -> Self {
        AttrValue::Rotation(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

/// Which side of the simulation owns a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Authority {
    /// Authoritative simulation; entity ticks write here
    #[default]
    Server,
    /// Replicated copy; only `assign_values` may change it
    Client,
}

/// One replicated attribute: slot id plus value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    pub id: u8,
    pub value: AttrValue,
}

#[derive(Debug, Clone)]
struct DataItem {
    value: AttrValue,
    initial: AttrValue,
    dirty: bool,
}

/// Change listener, called with the changed key after the new value is stored
pub type Listener<K> = Arc<dyn Fn(K, &mut SyncedStore<K>) -> Result<()> + Send + Sync>;

/// Keys changed since the last drain
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChangeSet<K> {
    bits: u64,
    _key: PhantomData<K>,
}

impl<K: AttributeKey> ChangeSet<K> {
    pub fn empty() -> Self {
        Self {
            bits: 0,
            _key: PhantomData,
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.bits & (1u64 << key.index()) != 0
    }

    /// True when any of `keys` changed
    pub fn any(&self, keys: &[K]) -> bool {
        keys.iter().any(|k| self.contains(*k))
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Changed keys in slot order
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        (0..K::COUNT)
            .filter(move |&i| self.bits & (1u64 << i) != 0)
            .filter_map(K::from_index)
    }
}

impl<K: AttributeKey> fmt::Debug for ChangeSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Per-entity typed attribute store with change propagation
#[derive(Clone)]
pub struct SyncedStore<K: AttributeKey> {
    items: Vec<Option<DataItem>>,
    authority: Authority,
    locked: bool,
    dirty: bool,
    changed: u64,
    in_flight: u64,
    listeners: Arc<Vec<Listener<K>>>,
}

impl<K: AttributeKey> SyncedStore<K> {
    /// Create an empty authoritative store
    pub fn new() -> Self {
        Self::with_authority(Authority::Server)
    }

    pub fn with_authority(authority: Authority) -> Self {
        Self {
            items: vec![None; K::COUNT],
            authority,
            locked: false,
            dirty: false,
            changed: 0,
            in_flight: 0,
            listeners: Arc::new(Vec::new()),
        }
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Register a typed slot
    ///
    /// Only allowed while the store is unlocked (before the entity's first
    /// tick). Each key may be defined once.
    pub fn define(&mut self, key: K, default: impl Into<AttrValue>) -> Result<()> {
        if self.locked {
            return Err(ConfigurationError::DefinedAfterLock(key.name()).into());
        }
        let index = key.index();
        if index >= MAX_ATTRIBUTES {
            return Err(ConfigurationError::TooManyKeys {
                key: key.name(),
                index,
            }
            .into());
        }
        if index >= self.items.len() {
            self.items.resize(index + 1, None);
        }
        let slot = &mut self.items[index];
        if slot.is_some() {
            return Err(ConfigurationError::Duplicate(key.name()).into());
        }
        let value = default.into();
        *slot = Some(DataItem {
            initial: value.clone(),
            value,
            dirty: false,
        });
        Ok(())
    }

    /// Close registration; further `define` calls fail
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_defined(&self, key: K) -> bool {
        matches!(self.items.get(key.index()), Some(Some(_)))
    }

    /// Register a change listener; listeners run in registration order
    pub fn subscribe(
        &mut self,
        listener: impl Fn(K, &mut SyncedStore<K>) -> Result<()> + Send + Sync + 'static,
    ) {
        Arc::make_mut(&mut self.listeners).push(Arc::new(listener));
    }

    pub fn get(&self, key: K) -> Result<&AttrValue> {
        self.item(key).map(|item| &item.value)
    }

    pub fn get_bool(&self, key: K) -> Result<bool> {
        match self.get(key)? {
            AttrValue::Bool(v) => Ok(*v),
            other => Err(mismatch(key, "bool", other)),
        }
    }

    pub fn get_byte(&self, key: K) -> Result<i8> {
        match self.get(key)? {
            AttrValue::Byte(v) => Ok(*v),
            other => Err(mismatch(key, "byte", other)),
        }
    }

    pub fn get_int(&self, key: K) -> Result<i32> {
        match self.get(key)? {
            AttrValue::Int(v) => Ok(*v),
            other => Err(mismatch(key, "int", other)),
        }
    }

    pub fn get_float(&self, key: K) -> Result<f32> {
        match self.get(key)? {
            AttrValue::Float(v) => Ok(*v),
            other => Err(mismatch(key, "float", other)),
        }
    }

    pub fn get_vector(&self, key: K) -> Result<Vec3> {
        match self.get(key)? {
            AttrValue::Vector(v) => Ok(*v),
            other => Err(mismatch(key, "vector", other)),
        }
    }

    pub fn get_rotation(&self, key: K) -> Result<Quat> {
        match self.get(key)? {
            AttrValue::Rotation(v) => Ok(*v),
            other => Err(mismatch(key, "rotation", other)),
        }
    }

    pub fn get_text(&self, key: K) -> Result<&str> {
        match self.get(key)? {
            AttrValue::Text(v) => Ok(v),
            other => Err(mismatch(key, "text", other)),
        }
    }

    /// Write a value; a no-op when it equals the current one
    pub fn set(&mut self, key: K, value: impl Into<AttrValue>) -> Result<()> {
        self.write(key, value.into(), false)
    }

    /// Write a value and propagate even when it is unchanged
    pub fn set_forced(&mut self, key: K, value: impl Into<AttrValue>) -> Result<()> {
        self.write(key, value.into(), true)
    }

    fn write(&mut self, key: K, value: AttrValue, force: bool) -> Result<()> {
        if self.authority == Authority::Client {
            return Err(Error::ReadOnlyContext { key: key.name() });
        }
        let bit = 1u64 << key.index();
        if self.in_flight & bit != 0 {
            return Err(Error::ReentrantWrite { key: key.name() });
        }
        let item = self.item_mut(key)?;
        if !item.value.same_type(&value) {
            return Err(mismatch(key, item.value.type_name(), &value));
        }
        if !force && item.value == value {
            return Ok(());
        }
        item.value = value;
        item.dirty = true;
        self.dirty = true;
        self.changed |= bit;
        self.notify(key)
    }

    fn notify(&mut self, key: K) -> Result<()> {
        let bit = 1u64 << key.index();
        self.in_flight |= bit;
        let listeners = Arc::clone(&self.listeners);
        let mut result = Ok(());
        for listener in listeners.iter() {
            if let Err(err) = listener(key, self) {
                result = Err(err);
                break;
            }
        }
        self.in_flight &= !bit;
        result
    }

    /// Drain the keys changed since the last call
    pub fn take_changes(&mut self) -> ChangeSet<K> {
        let bits = std::mem::take(&mut self.changed);
        ChangeSet {
            bits,
            _key: PhantomData,
        }
    }

    /// Whether any slot has unreplicated changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Collect and clear the dirty slots; `None` when nothing changed
    pub fn pack_dirty(&mut self) -> Option<Vec<DataValue>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        let mut out = Vec::new();
        for (index, slot) in self.items.iter_mut().enumerate() {
            if let Some(item) = slot {
                if item.dirty {
                    item.dirty = false;
                    out.push(DataValue {
                        id: index as u8,
                        value: item.value.clone(),
                    });
                }
            }
        }
        Some(out)
    }

    /// Every defined slot, for a full resync
    pub fn pack_all(&self) -> Vec<DataValue> {
        self.defined()
            .map(|(index, item)| DataValue {
                id: index as u8,
                value: item.value.clone(),
            })
            .collect()
    }

    /// Slots whose value differs from the registered default
    pub fn non_default_values(&self) -> Option<Vec<DataValue>> {
        let out: Vec<DataValue> = self
            .defined()
            .filter(|(_, item)| item.value != item.initial)
            .map(|(index, item)| DataValue {
                id: index as u8,
                value: item.value.clone(),
            })
            .collect();
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Apply a replicated delta
    ///
    /// Accepted on stores of either authority. Values are type-checked before
    /// any of them is applied, so a bad delta leaves the store untouched.
    pub fn assign_values(&mut self, values: &[DataValue]) -> Result<()> {
        let mut keys = Vec::with_capacity(values.len());
        for data in values {
            let key = K::from_index(data.id as usize).ok_or(Error::UnknownAttributeId(data.id))?;
            let item = self.item(key)?;
            if !item.value.same_type(&data.value) {
                return Err(mismatch(key, item.value.type_name(), &data.value));
            }
            keys.push(key);
        }
        for (key, data) in keys.into_iter().zip(values) {
            let bit = 1u64 << key.index();
            if self.in_flight & bit != 0 {
                return Err(Error::ReentrantWrite { key: key.name() });
            }
            self.item_mut(key)?.value = data.value.clone();
            self.changed |= bit;
            self.notify(key)?;
        }
        Ok(())
    }

    fn defined(&self) -> impl Iterator<Item = (usize, &DataItem)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|item| (index, item)))
    }

    fn item(&self, key: K) -> Result<&DataItem> {
        self.items
            .get(key.index())
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownAttribute(key.name()))
    }

    fn item_mut(&mut self, key: K) -> Result<&mut DataItem> {
        self.items
            .get_mut(key.index())
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownAttribute(key.name()))
    }
}

impl<K: AttributeKey> Default for SyncedStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AttributeKey> fmt::Debug for SyncedStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (index, item) in self.defined() {
            match K::from_index(index) {
                Some(key) => map.entry(&key.name(), &item.value),
                None => map.entry(&index, &item.value),
            };
        }
        map.finish()
    }
}

fn mismatch<K: AttributeKey>(key: K, expected: &'static str, got: &AttrValue) -> Error {
    Error::TypeMismatch {
        key: key.name(),
        expected,
        got: got.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    crate::attribute_keys! {
        enum TestKey {
            Age => "Age",
            Baby => "Baby",
            Scale => "Scale",
            Label => "Label",
        }
    }

    fn store() -> SyncedStore<TestKey> {
        let mut store = SyncedStore::new();
        store.define(TestKey::Age, 0i32).unwrap();
        store.define(TestKey::Baby, false).unwrap();
        store.define(TestKey::Scale, Vec3::ONE).unwrap();
        store.define(TestKey::Label, "").unwrap();
        store
    }

    #[test]
    fn test_define_after_lock_fails() {
        let mut s = SyncedStore::<TestKey>::new();
        s.define(TestKey::Age, 0i32).unwrap();
        s.lock();
        let err = s.define(TestKey::Baby, false).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::DefinedAfterLock("Baby"))
        ));
    }

    #[test]
    fn test_duplicate_define_fails() {
        let mut s = store();
        let err = s.define(TestKey::Age, 5i32).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::Duplicate("Age"))
        ));
        assert_eq!(s.get_int(TestKey::Age).unwrap(), 0);
    }

    #[test]
    fn test_set_unchanged_is_silent() {
        let mut s = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        s.subscribe(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        s.set(TestKey::Age, 0i32).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!s.is_dirty());

        s.set_forced(TestKey::Age, 0i32).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(s.is_dirty());
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut s = store();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            s.subscribe(move |key, _| {
                log.lock().unwrap().push((tag, key));
                Ok(())
            });
        }
        s.set(TestKey::Age, -24000i32).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![("first", TestKey::Age), ("second", TestKey::Age)]
        );
    }

    #[test]
    fn test_listener_cascades_to_other_key() {
        let mut s = store();
        s.subscribe(|key, store| {
            if key == TestKey::Age {
                let baby = store.get_int(TestKey::Age)? < 0;
                store.set(TestKey::Baby, baby)?;
            }
            Ok(())
        });
        s.set(TestKey::Age, -10i32).unwrap();
        assert!(s.get_bool(TestKey::Baby).unwrap());

        let changes = s.take_changes();
        assert!(changes.contains(TestKey::Age));
        assert!(changes.contains(TestKey::Baby));
        assert!(!changes.contains(TestKey::Scale));
        assert!(s.take_changes().is_empty());
    }

    #[test]
    fn test_reentrant_write_to_same_key_rejected() {
        let mut s = store();
        s.subscribe(|key, store| {
            if key == TestKey::Age {
                let age = store.get_int(TestKey::Age)?;
                store.set(TestKey::Age, age + 1)?;
            }
            Ok(())
        });
        let err = s.set(TestKey::Age, 1i32).unwrap_err();
        assert!(matches!(err, Error::ReentrantWrite { key: "Age" }));
        // the outer write itself landed before propagation
        assert_eq!(s.get_int(TestKey::Age).unwrap(), 1);
    }

    #[test]
    fn test_indirect_cycle_rejected() {
        let mut s = store();
        s.subscribe(|key, store| match key {
            TestKey::Age => store.set(TestKey::Label, "from age"),
            TestKey::Label => store.set(TestKey::Age, 99i32),
            _ => Ok(()),
        });
        let err = s.set(TestKey::Age, 5i32).unwrap_err();
        assert!(matches!(err, Error::ReentrantWrite { key: "Age" }));
    }

    #[test]
    fn test_type_mismatch() {
        let mut s = store();
        let err = s.set(TestKey::Age, 1.5f32).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                key: "Age",
                expected: "int",
                got: "float"
            }
        ));
        assert!(s.get_float(TestKey::Age).is_err());
    }

    #[test]
    fn test_client_store_is_read_only() {
        let mut s = SyncedStore::<TestKey>::with_authority(Authority::Client);
        s.define(TestKey::Age, 0i32).unwrap();
        assert!(matches!(
            s.set(TestKey::Age, 3i32),
            Err(Error::ReadOnlyContext { key: "Age" })
        ));

        s.assign_values(&[DataValue {
            id: 0,
            value: AttrValue::Int(3),
        }])
        .unwrap();
        assert_eq!(s.get_int(TestKey::Age).unwrap(), 3);
        assert!(s.take_changes().contains(TestKey::Age));
    }

    #[test]
    fn test_pack_dirty_clears() {
        let mut s = store();
        assert!(s.pack_dirty().is_none());
        s.set(TestKey::Scale, Vec3::splat(2.0)).unwrap();
        s.set(TestKey::Label, "hi").unwrap();
        let packed = s.pack_dirty().unwrap();
        assert_eq!(
            packed,
            vec![
                DataValue {
                    id: 2,
                    value: AttrValue::Vector(Vec3::splat(2.0))
                },
                DataValue {
                    id: 3,
                    value: AttrValue::Text("hi".into())
                },
            ]
        );
        assert!(s.pack_dirty().is_none());
    }

    #[test]
    fn test_replicate_into_client() {
        let mut server = store();
        server.set(TestKey::Age, -5i32).unwrap();
        let mut client = SyncedStore::<TestKey>::with_authority(Authority::Client);
        client.define(TestKey::Age, 0i32).unwrap();
        client.define(TestKey::Baby, false).unwrap();
        client.define(TestKey::Scale, Vec3::ONE).unwrap();
        client.define(TestKey::Label, "").unwrap();

        client.assign_values(&server.pack_all()).unwrap();
        assert_eq!(client.get_int(TestKey::Age).unwrap(), -5);
        assert_eq!(server.non_default_values().unwrap().len(), 1);
        assert!(client.non_default_values().is_some());
    }

    #[test]
    fn test_assign_rejects_bad_delta_atomically() {
        let mut s = store();
        let delta = [
            DataValue {
                id: 0,
                value: AttrValue::Int(7),
            },
            DataValue {
                id: 1,
                value: AttrValue::Int(1),
            },
        ];
        assert!(s.assign_values(&delta).is_err());
        assert_eq!(s.get_int(TestKey::Age).unwrap(), 0);
        assert!(matches!(
            s.assign_values(&[DataValue {
                id: 9,
                value: AttrValue::Bool(true)
            }]),
            Err(Error::UnknownAttributeId(9))
        ));
    }

    #[test]
    fn test_unknown_key() {
        let mut s = SyncedStore::<TestKey>::new();
        assert!(matches!(
            s.set(TestKey::Label, "x"),
            Err(Error::UnknownAttribute("Label"))
        ));
        assert!(!s.is_defined(TestKey::Label));
    }
}
