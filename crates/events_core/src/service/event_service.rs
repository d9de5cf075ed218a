//! Event use-case service.
//!
//! # Responsibility
//! - Mediate between the event, participant and logistics stores.
//! - Apply association rules and the organizer cost report.
//!
//! # Invariants
//! - Lookup misses surface as typed not-found errors, never panics.
//! - Store failures propagate unchanged inside `EventServiceError::Repo`.
//! - The service keeps no state between calls; all state lives in stores.

use crate::model::event::{Event, EventId};
use crate::model::logistics::Logistics;
use crate::model::participant::{Participant, ParticipantId, Role};
use crate::repo::event_repo::EventRepository;
use crate::repo::logistics_repo::LogisticsRepository;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Participant filter selecting the events covered by the cost report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantFilter {
    pub surname: &'static str,
    pub given_name: &'static str,
    pub role: Role,
}

/// Events organized by this participant are the ones costed by `calculate_cost`.
pub const COST_REPORT_FILTER: ParticipantFilter = ParticipantFilter {
    surname: "Tounsi",
    given_name: "Ahmed",
    role: Role::Organizer,
};

/// Errors from event service operations.
#[derive(Debug)]
pub enum EventServiceError {
    ParticipantNotFound(ParticipantId),
    /// No event carries this description.
    EventNotFound(String),
    /// Query window ends before it starts.
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    /// Store-layer failure.
    Repo(RepoError),
}

impl Display for EventServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::EventNotFound(description) => {
                write!(f, "event not found for description `{description}`")
            }
            Self::InvalidDateRange { start, end } => {
                write!(f, "invalid date range: {start} is after {end}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EventServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EventServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ServiceResult<T> = Result<T, EventServiceError>;

/// Reserved-logistics cost of one event, as computed by `calculate_cost`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCost {
    pub event_id: EventId,
    pub description: String,
    pub total_cost: f64,
}

/// Service facade over the three stores.
pub struct EventService<E, P, L> {
    events: E,
    participants: P,
    logistics: L,
}

impl<E, P, L> EventService<E, P, L>
where
    E: EventRepository,
    P: ParticipantRepository,
    L: LogisticsRepository,
{
    pub fn new(events: E, participants: P, logistics: L) -> Self {
        Self {
            events,
            participants,
            logistics,
        }
    }

    /// Persists a new event as-is.
    pub fn create_event(&self, event: &Event) -> ServiceResult<Event> {
        let saved = self.events.save_event(event)?;
        info!(
            "event=event_create module=service status=ok event_id={}",
            saved.id
        );
        Ok(saved)
    }

    /// Persists a participant without further checks.
    pub fn add_participant(&self, participant: &Participant) -> ServiceResult<Participant> {
        let saved = self.participants.save_participant(participant)?;
        info!(
            "event=participant_add module=service status=ok participant_id={}",
            saved.id
        );
        Ok(saved)
    }

    /// Looks up an event by its unique description.
    ///
    /// # Errors
    /// - `EventNotFound` when no event has `description`.
    pub fn event_by_description(&self, description: &str) -> ServiceResult<Event> {
        self.events
            .find_event_by_description(description)?
            .ok_or_else(|| EventServiceError::EventNotFound(description.to_string()))
    }

    /// Makes the participant a member of `event` and persists the event.
    ///
    /// When the event is already stored, the membership is merged into the
    /// stored aggregate so logistics and earlier members missing from
    /// `event` are kept.
    ///
    /// # Errors
    /// - `ParticipantNotFound` when no participant has `participant_id`.
    pub fn add_affect_event_participant(
        &self,
        event: Event,
        participant_id: ParticipantId,
    ) -> ServiceResult<Event> {
        let Some(mut participant) = self.participants.find_participant_by_id(participant_id)?
        else {
            warn!(
                "event=participant_assign module=service status=error error_code=participant_not_found participant_id={participant_id}"
            );
            return Err(EventServiceError::ParticipantNotFound(participant_id));
        };

        let mut target = match self.events.find_event_by_id(event.id)? {
            Some(stored) => stored,
            None => event,
        };
        let added = target.add_participant(&mut participant);
        let saved = self.events.save_event(&target)?;
        info!(
            "event=participant_assign module=service status=ok event_id={} participant_id={} added={} participants={}",
            saved.id,
            participant_id,
            added,
            saved.participants.len()
        );
        Ok(saved)
    }

    /// Attaches `logistics` to the event with the given description.
    ///
    /// Only the logistics record is written; its owning-event reference is
    /// the association, so the event row itself is unchanged.
    ///
    /// # Errors
    /// - `EventNotFound` when no event has `event_description`.
    pub fn add_affect_logistics(
        &self,
        logistics: Logistics,
        event_description: &str,
    ) -> ServiceResult<Logistics> {
        let Some(mut event) = self.events.find_event_by_description(event_description)? else {
            warn!(
                "event=logistics_attach module=service status=error error_code=event_not_found"
            );
            return Err(EventServiceError::EventNotFound(
                event_description.to_string(),
            ));
        };

        event.attach_logistics(logistics.clone());
        let saved = self.logistics.save_logistics(event.id, &logistics)?;
        info!(
            "event=logistics_attach module=service status=ok event_id={} logistics_id={} logistics_count={}",
            event.id,
            saved.id,
            event.logistics.len()
        );
        Ok(saved)
    }

    /// Reserved logistics of all events overlapping `[start, end]`.
    ///
    /// Items are grouped by event (store order) and keep insertion order
    /// within each event.
    pub fn get_logistics_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Vec<Logistics>> {
        if start > end {
            return Err(EventServiceError::InvalidDateRange { start, end });
        }

        let events = self.events.find_events_overlapping(start, end)?;
        let reserved: Vec<Logistics> = events
            .iter()
            .flat_map(Event::reserved_logistics)
            .cloned()
            .collect();
        info!(
            "event=logistics_by_dates module=service status=ok events={} reserved={}",
            events.len(),
            reserved.len()
        );
        Ok(reserved)
    }

    /// Costs every event organized by `COST_REPORT_FILTER`.
    ///
    /// Each matching event is re-saved once, unchanged. Totals are logged
    /// and returned but not stored.
    pub fn calculate_cost(&self) -> ServiceResult<Vec<EventCost>> {
        let filter = COST_REPORT_FILTER;
        let events = self.events.find_events_by_participant(
            filter.surname,
            filter.given_name,
            filter.role,
        )?;

        let mut report = Vec::with_capacity(events.len());
        for event in events {
            let total_cost = event.reserved_cost();
            info!(
                "event=cost_report module=service status=ok event_id={} total_cost={:.2}",
                event.id, total_cost
            );
            let saved = self.events.save_event(&event)?;
            report.push(EventCost {
                event_id: saved.id,
                description: saved.description,
                total_cost,
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventService, EventServiceError, COST_REPORT_FILTER};
    use crate::model::event::{Event, EventId};
    use crate::model::logistics::Logistics;
    use crate::model::participant::{Participant, ParticipantId, Role};
    use crate::repo::event_repo::EventRepository;
    use crate::repo::logistics_repo::LogisticsRepository;
    use crate::repo::participant_repo::ParticipantRepository;
    use crate::repo::{RepoError, RepoResult};
    use chrono::{Duration, NaiveDate};
    use std::cell::RefCell;

    /// Records every call and answers from canned state.
    ///
    /// `save_event` replaces the stored aggregate wholesale, as the SQLite
    /// store does.
    #[derive(Default)]
    struct RecordingEvents {
        stored: RefCell<Vec<Event>>,
        /// Participants that `find_events_by_participant` resolves members against.
        members: RefCell<Vec<Participant>>,
        saved: RefCell<Vec<Event>>,
        id_lookups: RefCell<Vec<EventId>>,
        description_lookups: RefCell<Vec<String>>,
        overlap_lookups: RefCell<Vec<(NaiveDate, NaiveDate)>>,
        participant_lookups: RefCell<Vec<(String, String, Role)>>,
    }

    impl EventRepository for &RecordingEvents {
        fn save_event(&self, event: &Event) -> RepoResult<Event> {
            self.saved.borrow_mut().push(event.clone());
            let mut stored = self.stored.borrow_mut();
            match stored.iter_mut().find(|existing| existing.id == event.id) {
                Some(existing) => *existing = event.clone(),
                None => stored.push(event.clone()),
            }
            Ok(event.clone())
        }

        fn find_event_by_id(&self, id: EventId) -> RepoResult<Option<Event>> {
            self.id_lookups.borrow_mut().push(id);
            Ok(self
                .stored
                .borrow()
                .iter()
                .find(|event| event.id == id)
                .cloned())
        }

        fn find_event_by_description(&self, description: &str) -> RepoResult<Option<Event>> {
            self.description_lookups
                .borrow_mut()
                .push(description.to_string());
            Ok(self
                .stored
                .borrow()
                .iter()
                .find(|event| event.description == description)
                .cloned())
        }

        fn find_events_overlapping(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> RepoResult<Vec<Event>> {
            self.overlap_lookups.borrow_mut().push((start, end));
            Ok(self
                .stored
                .borrow()
                .iter()
                .filter(|event| event.overlaps(start, end))
                .cloned()
                .collect())
        }

        fn find_events_by_participant(
            &self,
            surname: &str,
            given_name: &str,
            role: Role,
        ) -> RepoResult<Vec<Event>> {
            self.participant_lookups.borrow_mut().push((
                surname.to_string(),
                given_name.to_string(),
                role,
            ));
            let members = self.members.borrow();
            Ok(self
                .stored
                .borrow()
                .iter()
                .filter(|event| {
                    members.iter().any(|member| {
                        event.participants.contains(&member.id)
                            && member.matches(surname, given_name, role)
                    })
                })
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingParticipants {
        stored: RefCell<Vec<Participant>>,
        saved: RefCell<Vec<Participant>>,
        id_lookups: RefCell<Vec<ParticipantId>>,
    }

    impl ParticipantRepository for &RecordingParticipants {
        fn save_participant(&self, participant: &Participant) -> RepoResult<Participant> {
            self.saved.borrow_mut().push(participant.clone());
            Ok(participant.clone())
        }

        fn find_participant_by_id(&self, id: ParticipantId) -> RepoResult<Option<Participant>> {
            self.id_lookups.borrow_mut().push(id);
            Ok(self
                .stored
                .borrow()
                .iter()
                .find(|participant| participant.id == id)
                .cloned())
        }
    }

    #[derive(Default)]
    struct RecordingLogistics {
        saved: RefCell<Vec<(EventId, Logistics)>>,
        fail_with_missing_event: bool,
    }

    impl LogisticsRepository for &RecordingLogistics {
        fn save_logistics(&self, event_id: EventId, logistics: &Logistics) -> RepoResult<Logistics> {
            if self.fail_with_missing_event {
                return Err(RepoError::EventNotFound(event_id));
            }
            self.saved.borrow_mut().push((event_id, logistics.clone()));
            Ok(logistics.clone())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid test date")
    }

    fn event(description: &str) -> Event {
        Event::new(description, today(), today())
    }

    #[test]
    fn add_participant_saves_once_and_returns_store_result() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let service = EventService::new(&events, &participants, &logistics);

        let participant = Participant::new("Ben Salah", "Sami", Role::Guest);
        let saved = service.add_participant(&participant).unwrap();

        assert_eq!(saved, participant);
        assert_eq!(*participants.saved.borrow(), vec![participant]);
    }

    #[test]
    fn add_affect_event_participant_links_both_sides_and_saves_event_once() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let participant = Participant::new("Tounsi", "Ahmed", Role::Organizer);
        participants.stored.borrow_mut().push(participant.clone());
        let service = EventService::new(&events, &participants, &logistics);

        let target = event("Test Event");
        let saved = service
            .add_affect_event_participant(target.clone(), participant.id)
            .unwrap();

        assert_eq!(saved.id, target.id);
        assert_eq!(saved.participants.len(), 1);
        assert!(saved.participants.contains(&participant.id));
        assert_eq!(*participants.id_lookups.borrow(), vec![participant.id]);
        assert_eq!(events.saved.borrow().len(), 1);
    }

    #[test]
    fn add_affect_event_participant_with_unknown_id_is_not_found() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let service = EventService::new(&events, &participants, &logistics);

        let missing = ParticipantId::new_v4();
        let err = service
            .add_affect_event_participant(event("Test Event"), missing)
            .unwrap_err();

        assert!(matches!(err, EventServiceError::ParticipantNotFound(id) if id == missing));
        assert!(events.saved.borrow().is_empty());
    }

    #[test]
    fn add_affect_logistics_saves_logistics_for_owning_event() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let owner = event("Test Event");
        events.stored.borrow_mut().push(owner.clone());
        let service = EventService::new(&events, &participants, &logistics);

        let item = Logistics::new("chairs", 3.5, 40);
        let saved = service
            .add_affect_logistics(item.clone(), "Test Event")
            .unwrap();

        assert_eq!(saved, item);
        assert_eq!(*events.description_lookups.borrow(), vec!["Test Event"]);
        assert_eq!(*logistics.saved.borrow(), vec![(owner.id, item)]);
        assert!(events.saved.borrow().is_empty());
    }

    #[test]
    fn add_affect_logistics_with_unknown_description_is_not_found() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let service = EventService::new(&events, &participants, &logistics);

        let err = service
            .add_affect_logistics(Logistics::new("chairs", 1.0, 1), "Nope")
            .unwrap_err();

        assert!(matches!(err, EventServiceError::EventNotFound(ref d) if d == "Nope"));
        assert!(logistics.saved.borrow().is_empty());
    }

    #[test]
    fn store_failures_propagate_unchanged() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics {
            fail_with_missing_event: true,
            ..RecordingLogistics::default()
        };
        let owner = event("Test Event");
        events.stored.borrow_mut().push(owner.clone());
        let service = EventService::new(&events, &participants, &logistics);

        let err = service
            .add_affect_logistics(Logistics::new("chairs", 1.0, 1), "Test Event")
            .unwrap_err();

        assert!(matches!(
            err,
            EventServiceError::Repo(RepoError::EventNotFound(id)) if id == owner.id
        ));
    }

    #[test]
    fn get_logistics_dates_returns_reserved_items_of_overlapping_events_only() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();

        let reserved = Logistics::new("stage", 10.0, 2).reserved(true);
        let mut first = event("Event 1");
        first.attach_logistics(reserved.clone());
        let mut second = event("Event 2");
        second.attach_logistics(Logistics::new("lights", 5.0, 1));
        let later = today() + Duration::days(30);
        let mut outside = Event::new("Event 3", later, later);
        outside.attach_logistics(Logistics::new("tent", 80.0, 1).reserved(true));
        events.stored.borrow_mut().extend([first, second, outside]);
        let service = EventService::new(&events, &participants, &logistics);

        let start = today() - Duration::days(1);
        let end = today() + Duration::days(1);
        let result = service.get_logistics_dates(start, end).unwrap();

        assert_eq!(result, vec![reserved]);
        assert_eq!(*events.overlap_lookups.borrow(), vec![(start, end)]);
    }

    #[test]
    fn get_logistics_dates_rejects_inverted_window() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let service = EventService::new(&events, &participants, &logistics);

        let err = service
            .get_logistics_dates(today(), today() - Duration::days(1))
            .unwrap_err();

        assert!(matches!(err, EventServiceError::InvalidDateRange { .. }));
        assert!(events.overlap_lookups.borrow().is_empty());
    }

    #[test]
    fn calculate_cost_queries_fixed_filter_and_resaves_each_event_once() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();

        let mut organizer = Participant::new("Tounsi", "Ahmed", Role::Organizer);
        let mut guest = Participant::new("Tounsi", "Ahmed", Role::Guest);
        let mut first = event("Event 1");
        first.attach_logistics(Logistics::new("stage", 10.0, 2).reserved(true));
        first.add_participant(&mut organizer);
        let mut second = event("Event 2");
        second.attach_logistics(Logistics::new("lights", 5.0, 1));
        second.add_participant(&mut organizer);
        let mut unrelated = event("Event 3");
        unrelated.attach_logistics(Logistics::new("tent", 80.0, 1).reserved(true));
        unrelated.add_participant(&mut guest);
        events
            .stored
            .borrow_mut()
            .extend([first.clone(), second.clone(), unrelated]);
        events.members.borrow_mut().extend([organizer, guest]);
        let service = EventService::new(&events, &participants, &logistics);

        let report = service.calculate_cost().unwrap();

        assert_eq!(
            *events.participant_lookups.borrow(),
            vec![(
                COST_REPORT_FILTER.surname.to_string(),
                COST_REPORT_FILTER.given_name.to_string(),
                Role::Organizer
            )]
        );
        assert_eq!(*events.saved.borrow(), vec![first.clone(), second.clone()]);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].event_id, first.id);
        assert_eq!(report[0].total_cost, 20.0);
        assert_eq!(report[1].event_id, second.id);
        assert_eq!(report[1].total_cost, 0.0);
    }

    #[test]
    fn add_affect_event_participant_merges_into_stored_aggregate() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let mut first = Participant::new("Ben Salah", "Sami", Role::Guest);
        let second = Participant::new("Jlassi", "Rim", Role::Animator);
        participants
            .stored
            .borrow_mut()
            .extend([first.clone(), second.clone()]);

        let stale = event("Test Event");
        let mut stored = stale.clone();
        stored.attach_logistics(Logistics::new("stage", 10.0, 1).reserved(true));
        stored.add_participant(&mut first);
        events.stored.borrow_mut().push(stored);
        let service = EventService::new(&events, &participants, &logistics);

        let saved = service
            .add_affect_event_participant(stale.clone(), second.id)
            .unwrap();

        assert_eq!(*events.id_lookups.borrow(), vec![stale.id]);
        assert_eq!(saved.logistics.len(), 1);
        assert_eq!(saved.participants.len(), 2);
        assert!(saved.participants.contains(&first.id));
        assert!(saved.participants.contains(&second.id));
    }

    #[test]
    fn event_by_description_maps_miss_to_not_found() {
        let events = RecordingEvents::default();
        let participants = RecordingParticipants::default();
        let logistics = RecordingLogistics::default();
        let owner = event("Test Event");
        events.stored.borrow_mut().push(owner.clone());
        let service = EventService::new(&events, &participants, &logistics);

        assert_eq!(service.event_by_description("Test Event").unwrap(), owner);
        let err = service.event_by_description("Nope").unwrap_err();
        assert!(matches!(err, EventServiceError::EventNotFound(ref d) if d == "Nope"));
    }
}
