//! In-memory `RecordApi` used by the controller tests.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{
        Car, Coordinates, HumanBeing, HumanBeingCreateRequest, HumanBeingId,
        HumanBeingUpdateRequest, Mood, WeaponType,
    },
    protocol::{ListQuery, PageResponse, SoundtrackGroups},
};

use crate::{ClientError, ClientResult, RecordApi};

#[derive(Default)]
struct FakeState {
    records: Vec<HumanBeing>,
    next_id: i64,
    fail_with: Option<(StatusCode, String)>,
    calls: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

pub(crate) fn sample_request(name: &str, weapon_type: WeaponType) -> HumanBeingCreateRequest {
    HumanBeingCreateRequest {
        name: name.to_string(),
        coordinates: Coordinates { x: 3, y: 14.5 },
        real_hero: true,
        has_toothpick: Some(false),
        car: None,
        mood: Some(Mood::Longing),
        impact_speed: 120.25,
        soundtrack_name: "Imagine".to_string(),
        weapon_type,
    }
}

impl FakeApi {
    pub(crate) fn with_records(count: usize) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            for index in 0..count {
                let request = sample_request(&format!("human-{index}"), WeaponType::Knife);
                insert(&mut state, request);
            }
            state.calls.clear();
        }
        api
    }

    pub(crate) fn insert(&self, request: HumanBeingCreateRequest) -> HumanBeing {
        insert(&mut self.state.lock().unwrap(), request)
    }

    /// Makes every following call fail with `status` until cleared.
    pub(crate) fn fail_with(&self, status: StatusCode, message: &str) {
        self.state.lock().unwrap().fail_with = Some((status, message.to_string()));
    }

    pub(crate) fn clear_failure(&self) {
        self.state.lock().unwrap().fail_with = None;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn records(&self) -> Vec<HumanBeing> {
        self.state.lock().unwrap().records.clone()
    }

    fn enter(&self, call: String) -> ClientResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some((status, message)) = state.fail_with.clone() {
            return Err(ClientError::Backend { status, message });
        }
        Ok(state)
    }
}

fn insert(state: &mut FakeState, request: HumanBeingCreateRequest) -> HumanBeing {
    state.next_id += 1;
    let record = materialize(HumanBeingId(state.next_id), request);
    state.records.push(record.clone());
    record
}

fn materialize(id: HumanBeingId, request: HumanBeingCreateRequest) -> HumanBeing {
    HumanBeing {
        id,
        name: request.name,
        coordinates: request.coordinates,
        creation_date: "2024-05-01T12:30:00".to_string(),
        real_hero: request.real_hero,
        has_toothpick: request.has_toothpick,
        car: request.car,
        mood: request.mood,
        impact_speed: request.impact_speed,
        soundtrack_name: request.soundtrack_name,
        weapon_type: request.weapon_type,
    }
}

fn not_found(id: HumanBeingId) -> ClientError {
    ClientError::Backend {
        status: StatusCode::NOT_FOUND,
        message: format!("HumanBeing with id {id} not found"),
    }
}

#[async_trait]
impl RecordApi for FakeApi {
    async fn list(&self, query: &ListQuery) -> ClientResult<PageResponse<HumanBeing>> {
        let state = self.enter(format!("list page={} size={}", query.page, query.size))?;
        let matching: Vec<_> = state
            .records
            .iter()
            .filter(|record| match &query.search {
                Some(term) => record.name.contains(term.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let size = query.size.max(1);
        let content = matching
            .into_iter()
            .skip((query.page * size) as usize)
            .take(size as usize)
            .collect();
        Ok(PageResponse {
            content,
            total_elements: total,
            total_pages: total.div_ceil(u64::from(size)) as u32,
            size,
            number: query.page,
        })
    }

    async fn get(&self, id: HumanBeingId) -> ClientResult<HumanBeing> {
        let state = self.enter(format!("get {id}"))?;
        state
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, request: &HumanBeingCreateRequest) -> ClientResult<HumanBeing> {
        let mut state = self.enter("create".to_string())?;
        Ok(insert(&mut state, request.clone()))
    }

    async fn update(
        &self,
        id: HumanBeingId,
        request: &HumanBeingUpdateRequest,
    ) -> ClientResult<HumanBeing> {
        let mut state = self.enter(format!("update {id}"))?;
        let slot = state
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| not_found(id))?;
        let mut updated = materialize(request.id, request.fields.clone());
        updated.creation_date = slot.creation_date.clone();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: HumanBeingId) -> ClientResult<()> {
        let mut state = self.enter(format!("delete {id}"))?;
        let before = state.records.len();
        state.records.retain(|record| record.id != id);
        if state.records.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete_all_by_weapon_type(&self, weapon_type: WeaponType) -> ClientResult<()> {
        let mut state = self.enter(format!("delete-all {weapon_type}"))?;
        state
            .records
            .retain(|record| record.weapon_type != weapon_type);
        Ok(())
    }

    async fn delete_one_by_weapon_type(&self, weapon_type: WeaponType) -> ClientResult<()> {
        let mut state = self.enter(format!("delete-one {weapon_type}"))?;
        if let Some(index) = state
            .records
            .iter()
            .position(|record| record.weapon_type == weapon_type)
        {
            state.records.remove(index);
        }
        Ok(())
    }

    async fn group_by_soundtrack(&self) -> ClientResult<SoundtrackGroups> {
        let state = self.enter("group-by-soundtrack".to_string())?;
        let mut groups: Vec<(String, u64)> = Vec::new();
        for record in &state.records {
            match groups
                .iter_mut()
                .find(|(name, _)| *name == record.soundtrack_name)
            {
                Some((_, count)) => *count += 1,
                None => groups.push((record.soundtrack_name.clone(), 1)),
            }
        }
        Ok(groups.into_iter().collect())
    }

    async fn update_all_moods_to_sadness(&self) -> ClientResult<()> {
        let mut state = self.enter("mood-sadness".to_string())?;
        for record in &mut state.records {
            record.mood = Some(Mood::Sadness);
        }
        Ok(())
    }

    async fn assign_car_to_heroes_without_car(&self) -> ClientResult<()> {
        let mut state = self.enter("assign-cars".to_string())?;
        for record in state
            .records
            .iter_mut()
            .filter(|record| record.real_hero && record.car.is_none())
        {
            record.car = Some(Car {
                name: "Lada Kalina".to_string(),
                cool: true,
            });
        }
        Ok(())
    }
}
