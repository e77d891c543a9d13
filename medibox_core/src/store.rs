//! Box persistence with file locking.
//!
//! The whole compartment collection is stored as one JSON document. Saves go
//! through a locked temp file and an atomic rename. There is no rollback: if a
//! save fails, the in-memory box and the file on disk disagree until the next
//! successful save.

use crate::config::InventoryConfig;
use crate::schedule::parse_hour_minute;
use crate::{Compartment, CompartmentId, Error, Result, Schedule};
use chrono::FixedOffset;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// The provisioned set of compartments
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct MediBox {
    pub compartments: Vec<Compartment>,
}

impl MediBox {
    /// Provision compartments `1..=count` with default quantities.
    pub fn provision(count: u32) -> Self {
        Self {
            compartments: (1..=count).map(Compartment::new).collect(),
        }
    }

    /// Provision according to inventory settings.
    pub fn provision_with(inventory: &InventoryConfig) -> Self {
        let mut medibox = Self::provision(inventory.compartment_count);
        for compartment in &mut medibox.compartments {
            compartment.remaining_quantity = inventory.reset_quantity;
            compartment.low_stock_threshold = inventory.default_low_stock_threshold;
        }
        medibox
    }

    /// Load the box from a file with shared locking
    ///
    /// A missing file yields a freshly provisioned box. An unreadable or
    /// unparsable file logs a warning and also yields a provisioned box.
    /// Duplicate slot ids are an error.
    pub fn load(path: &Path, inventory: &InventoryConfig) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No box file found, provisioning {} compartments", inventory.compartment_count);
            return Ok(Self::provision_with(inventory));
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open box file {:?}: {}. Using defaults.", path, e);
                return Ok(Self::provision_with(inventory));
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock box file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::provision_with(inventory));
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read box file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::provision_with(inventory));
        }

        file.unlock()?;

        match serde_json::from_str::<MediBox>(&contents) {
            Ok(medibox) => {
                medibox.validate()?;
                tracing::debug!(
                    "Loaded {} compartments from {:?}",
                    medibox.compartments.len(),
                    path
                );
                Ok(medibox)
            }
            Err(e) => {
                tracing::warn!("Failed to parse box file {:?}: {}. Using defaults.", path, e);
                Ok(Self::provision_with(inventory))
            }
        }
    }

    /// Save the box with exclusive locking and an atomic rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "box path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved box to {:?}", path);
        Ok(())
    }

    /// Persist in-memory mutations. Alias of [`MediBox::save`].
    pub fn flush(&self, path: &Path) -> Result<()> {
        self.save(path)
    }

    /// Load the box, modify it, and save it back
    pub fn update<F>(path: &Path, inventory: &InventoryConfig, f: F) -> Result<Self>
    where
        F: FnOnce(&mut MediBox) -> Result<()>,
    {
        let mut medibox = Self::load(path, inventory)?;
        f(&mut medibox)?;
        medibox.save(path)?;
        Ok(medibox)
    }

    /// Slot ids must be positive and unique; schedule ids unique box-wide.
    pub fn validate(&self) -> Result<()> {
        let mut slots = HashSet::new();
        let mut schedules = HashSet::new();
        for compartment in &self.compartments {
            if compartment.id.0 == 0 {
                return Err(Error::State("compartment id 0 is not a valid slot".into()));
            }
            if !slots.insert(compartment.id) {
                return Err(Error::State(format!(
                    "duplicate compartment {}",
                    compartment.id
                )));
            }
            for schedule in &compartment.schedules {
                if !schedules.insert(schedule.id) {
                    return Err(Error::State(format!("duplicate schedule {}", schedule.id)));
                }
            }
        }
        Ok(())
    }

    pub fn compartment(&self, id: CompartmentId) -> Result<&Compartment> {
        crate::find_compartment(&self.compartments, id).ok_or(Error::UnknownCompartment(id))
    }

    pub fn compartment_mut(&mut self, id: CompartmentId) -> Result<&mut Compartment> {
        crate::find_compartment_mut(&mut self.compartments, id)
            .ok_or(Error::UnknownCompartment(id))
    }

    /// Add a daily time to a compartment. Rejects values that would not
    /// normalize.
    pub fn add_schedule(&mut self, id: CompartmentId, time: &str) -> Result<Uuid> {
        let utc = FixedOffset::east_opt(0).ok_or_else(|| Error::Other("invalid offset".into()))?;
        if parse_hour_minute(time, &utc).is_none() {
            return Err(Error::InvalidTime(time.to_string()));
        }

        let schedule = Schedule::new(time.trim());
        let schedule_id = schedule.id;
        self.compartment_mut(id)?.schedules.push(schedule);
        tracing::info!("Added schedule {} at {} to compartment {}", schedule_id, time, id);
        Ok(schedule_id)
    }

    /// Remove one schedule wherever it lives. Returns whether it existed.
    pub fn remove_schedule(&mut self, schedule_id: Uuid) -> bool {
        for compartment in &mut self.compartments {
            let before = compartment.schedules.len();
            compartment.schedules.retain(|s| s.id != schedule_id);
            if compartment.schedules.len() != before {
                tracing::info!("Removed schedule {} from compartment {}", schedule_id, compartment.id);
                return true;
            }
        }
        false
    }

    /// Drop all schedules of one compartment. Returns how many were removed.
    pub fn clear_schedules(&mut self, id: CompartmentId) -> Result<usize> {
        let compartment = self.compartment_mut(id)?;
        let removed = compartment.schedules.len();
        compartment.schedules.clear();
        Ok(removed)
    }

    /// Remove a compartment together with every schedule it owns.
    pub fn remove_compartment(&mut self, id: CompartmentId) -> Result<Compartment> {
        let idx = self
            .compartments
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::UnknownCompartment(id))?;
        let removed = self.compartments.remove(idx);
        tracing::info!(
            "Removed compartment {} and {} schedules",
            id,
            removed.schedules.len()
        );
        Ok(removed)
    }
}
