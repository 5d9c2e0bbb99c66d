//! RON definition loader and the immutable type table it produces

use crate::error::{Error, Result};
use crate::schema::{EffectDef, EntityTypeDef, PotionDef};
use indexmap::{IndexMap, IndexSet};
use mobtick_core::DefId;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

const BUILTIN: &str = include_str!("../data/builtin.ron");

/// Static configuration shared by every region of a world
///
/// Built once by [`Loader::finish`] and never mutated afterwards; regions hold
/// it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entity_types: IndexMap<DefId, EntityTypeDef>,
    effects: IndexMap<DefId, EffectDef>,
    potions: IndexMap<DefId, PotionDef>,
    particles: IndexSet<DefId>,
}

impl TypeTable {
    /// The built-in definitions only
    pub fn builtin() -> Result<Self> {
        Loader::with_builtins()?.finish()
    }

    pub fn entity_type(&self, id: &DefId) -> Option<&EntityTypeDef> {
        self.entity_types.get(id)
    }

    pub fn effect(&self, id: &DefId) -> Option<&EffectDef> {
        self.effects.get(id)
    }

    pub fn potion(&self, id: &DefId) -> Option<&PotionDef> {
        self.potions.get(id)
    }

    pub fn has_particle(&self, id: &DefId) -> bool {
        self.particles.contains(id)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityTypeDef> {
        self.entity_types.values()
    }

    pub fn len(&self) -> usize {
        self.entity_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_types.is_empty()
    }
}

/// One RON definition file; every section is optional
#[derive(Debug, Default, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    particles: Vec<DefId>,
    #[serde(default)]
    effects: Vec<EffectDef>,
    #[serde(default)]
    potions: Vec<PotionDef>,
    #[serde(default)]
    entity_types: Vec<EntityTypeDef>,
}

/// Accumulates definitions from RON sources, then validates them into a [`TypeTable`]
#[derive(Debug, Default)]
pub struct Loader {
    table: TypeTable,
}

impl Loader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader pre-populated with the built-in definitions
    pub fn with_builtins() -> Result<Self> {
        let mut loader = Self::new();
        loader.load_str(BUILTIN)?;
        Ok(loader)
    }

    /// Load definitions from a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: DefinitionFile = ron::from_str(content)?;
        for particle in file.particles {
            if !self.table.particles.insert(particle.clone()) {
                return Err(Error::DuplicateDefinition(format!("particle {particle}")));
            }
        }
        for effect in file.effects {
            insert_unique(&mut self.table.effects, effect.id.clone(), effect, "effect")?;
        }
        for potion in file.potions {
            insert_unique(&mut self.table.potions, potion.id.clone(), potion, "potion")?;
        }
        for entity_type in file.entity_types {
            validate_entity_type(&entity_type)?;
            insert_unique(
                &mut self.table.entity_types,
                entity_type.id.clone(),
                entity_type,
                "entity type",
            )?;
        }
        Ok(())
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading definitions");
        self.load_str(&content)
    }

    /// Load all RON files from a directory, recursing into subdirectories
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // directory order is platform dependent
        entries.sort();

        for file_path in entries {
            if file_path.is_dir() {
                self.load_directory(&file_path)?;
            } else if file_path.extension().is_some_and(|e| e == "ron") {
                self.load_file(&file_path)?;
            }
        }
        Ok(())
    }

    /// Validate cross references and return the finished table
    pub fn finish(self) -> Result<TypeTable> {
        for potion in self.table.potions.values() {
            for entry in &potion.effects {
                if !self.table.effects.contains_key(&entry.effect) {
                    return Err(Error::UnknownReference {
                        owner: format!("potion {}", potion.id),
                        kind: "effect",
                        id: entry.effect.to_string(),
                    });
                }
            }
        }
        Ok(self.table)
    }
}

fn insert_unique<T>(
    map: &mut IndexMap<DefId, T>,
    id: DefId,
    value: T,
    kind: &str,
) -> Result<()> {
    if map.contains_key(&id) {
        return Err(Error::DuplicateDefinition(format!("{kind} {id}")));
    }
    map.insert(id, value);
    Ok(())
}

fn validate_entity_type(def: &EntityTypeDef) -> Result<()> {
    if !(def.width >= 0.0 && def.height >= 0.0) {
        return Err(Error::InvalidSchema(format!(
            "entity type {} has negative dimensions",
            def.id
        )));
    }
    if def.ageable.is_some() && !def.category.is_living() {
        return Err(Error::InvalidSchema(format!(
            "entity type {} is ageable but not living",
            def.id
        )));
    }
    if let Some(ageable) = &def.ageable {
        if !(0.0..=1.0).contains(&ageable.baby_chance) {
            return Err(Error::InvalidSchema(format!(
                "entity type {} has baby_chance outside [0, 1]",
                def.id
            )));
        }
    }
    Ok(())
}
