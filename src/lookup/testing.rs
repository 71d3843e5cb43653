//! Deterministic fakes for the store and remote seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Character, LookupError, LookupResult};
use crate::remote::CharacterSource;
use crate::store::CharacterStore;

pub(crate) fn character(id: i64, name: &str) -> Character {
    Character {
        id,
        name: name.to_string(),
        ki: "9000".into(),
        max_ki: "10000".into(),
        race: "Saiyan".into(),
        gender: "Male".into(),
        image: format!("{}.webp", name.to_lowercase()),
        affiliation: "Z Fighter".into(),
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    records: Mutex<HashMap<String, Character>>,
    get_error: Option<LookupError>,
    create_error: Option<LookupError>,
    create_delay: Option<Duration>,
    gets: AtomicU32,
    creates: AtomicU32,
}

impl FakeStore {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with(character: Character) -> Self {
        let store = Self::default();
        store
            .records
            .lock()
            .unwrap()
            .insert(character.name.clone(), character);
        store
    }

    pub(crate) fn failing_gets(err: LookupError) -> Self {
        Self {
            get_error: Some(err),
            ..Self::default()
        }
    }

    pub(crate) fn failing_creates(mut self, err: LookupError) -> Self {
        self.create_error = Some(err);
        self
    }

    pub(crate) fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub(crate) fn stored(&self, name: &str) -> Option<Character> {
        self.records.lock().unwrap().get(name).cloned()
    }

    pub(crate) fn gets(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CharacterStore for FakeStore {
    async fn get(&self, name: &str) -> LookupResult<Option<Character>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.get_error {
            return Err(err.clone());
        }
        Ok(self.stored(name))
    }

    async fn create(&self, character: &Character) -> LookupResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        self.records
            .lock()
            .unwrap()
            .entry(character.name.clone())
            .or_insert_with(|| character.clone());
        Ok(())
    }
}

pub(crate) struct FakeRemote {
    response: LookupResult<Character>,
    calls: AtomicU32,
}

impl FakeRemote {
    pub(crate) fn ok(character: Character) -> Self {
        Self {
            response: Ok(character),
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn err(err: LookupError) -> Self {
        Self {
            response: Err(err),
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CharacterSource for FakeRemote {
    async fn get(&self, _name: &str) -> LookupResult<Character> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}
