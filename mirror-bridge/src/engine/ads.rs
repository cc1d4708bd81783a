//! Ads and ad breaks
//!
//! An ad belongs to exactly one ad break; the relation is kept by native id
//! on the ad side, and by ownership on the break side.

use std::sync::{Arc, Mutex};

use mirror_common::protocol::{AdBreakEventType, AdEventType};

use super::dispatch::{EventDispatcher, ListenerId};
use super::{NativeEntity, NativeId};
use crate::lock::lock;

pub struct Ad {
    native_id: NativeId,
    pub id: String,
    pub integration: String,
    pub ad_type: String,
    pub duration: Option<f64>,
    pub skip_offset: Option<f64>,
    ad_break: Mutex<Option<NativeId>>,
}

impl Ad {
    pub fn new(id: impl Into<String>, integration: impl Into<String>) -> Self {
        Self {
            native_id: NativeId::next(),
            id: id.into(),
            integration: integration.into(),
            ad_type: "linear".to_string(),
            duration: None,
            skip_offset: None,
            ad_break: Mutex::new(None),
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_skip_offset(mut self, skip_offset: f64) -> Self {
        self.skip_offset = Some(skip_offset);
        self
    }

    pub fn ad_break(&self) -> Option<NativeId> {
        *lock(&self.ad_break)
    }
}

impl NativeEntity for Ad {
    fn native_id(&self) -> NativeId {
        self.native_id
    }
}

pub struct AdBreak {
    native_id: NativeId,
    pub integration: String,
    pub time_offset: f64,
    pub max_duration: Option<f64>,
    ads: Mutex<Vec<Arc<Ad>>>,
}

impl AdBreak {
    pub fn new(integration: impl Into<String>, time_offset: f64) -> Self {
        Self {
            native_id: NativeId::next(),
            integration: integration.into(),
            time_offset,
            max_duration: None,
            ads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_max_duration(mut self, max_duration: f64) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn ads(&self) -> Vec<Arc<Ad>> {
        lock(&self.ads).clone()
    }
}

impl NativeEntity for AdBreak {
    fn native_id(&self) -> NativeId {
        self.native_id
    }
}

/// Event emitted by the ads module
pub enum AdsEvent {
    Ad { kind: AdEventType, ad: Arc<Ad> },
    AdBreak { kind: AdBreakEventType, ad_break: Arc<AdBreak> },
}

#[derive(Default)]
struct AdsState {
    current_ads: Vec<Arc<Ad>>,
    current_ad_break: Option<Arc<AdBreak>>,
    scheduled_ad_breaks: Vec<Arc<AdBreak>>,
}

/// Ads module of a player
///
/// Every mutation is applied under the dispatcher lock right before its
/// event is delivered, so listeners reading the snapshot accessors see the
/// post-event state and [`observe`](Self::observe) never misses a change.
pub struct Ads {
    state: Mutex<AdsState>,
    events: EventDispatcher<AdsEvent>,
}

impl Ads {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AdsState::default()),
            events: EventDispatcher::new(),
        }
    }

    pub fn events(&self) -> &EventDispatcher<AdsEvent> {
        &self.events
    }

    pub fn current_ads(&self) -> Vec<Arc<Ad>> {
        lock(&self.state).current_ads.clone()
    }

    pub fn current_ad_break(&self) -> Option<Arc<AdBreak>> {
        lock(&self.state).current_ad_break.clone()
    }

    pub fn scheduled_ad_breaks(&self) -> Vec<Arc<AdBreak>> {
        lock(&self.state).scheduled_ad_breaks.clone()
    }

    /// Ads of every scheduled break, in schedule order
    pub fn scheduled_ads(&self) -> Vec<Arc<Ad>> {
        self.scheduled_ad_breaks()
            .iter()
            .flat_map(|ad_break| ad_break.ads())
            .collect()
    }

    /// Subscribe, first replaying `AddAdBreak` and `AddAd` for what is scheduled
    pub fn observe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AdsEvent) + Send + Sync + 'static,
    {
        self.events.observe(
            || {
                let mut replay = Vec::new();
                for ad_break in self.scheduled_ad_breaks() {
                    replay.push(AdsEvent::AdBreak {
                        kind: AdBreakEventType::AddAdBreak,
                        ad_break: ad_break.clone(),
                    });
                    for ad in ad_break.ads() {
                        replay.push(AdsEvent::Ad {
                            kind: AdEventType::AddAd,
                            ad,
                        });
                    }
                }
                replay
            },
            listener,
        )
    }

    pub fn schedule_ad_break(&self, ad_break: Arc<AdBreak>) {
        self.break_event(AdBreakEventType::AddAdBreak, ad_break, |state, ad_break| {
            state.scheduled_ad_breaks.push(ad_break.clone());
        });
    }

    pub fn add_ad(&self, ad_break: &Arc<AdBreak>, ad: Arc<Ad>) {
        self.ad_event(AdEventType::AddAd, ad, |_, ad| {
            *lock(&ad.ad_break) = Some(ad_break.native_id());
            lock(&ad_break.ads).push(ad.clone());
        });
    }

    pub fn begin_ad_break(&self, ad_break: Arc<AdBreak>) {
        self.break_event(AdBreakEventType::Begin, ad_break, |state, ad_break| {
            state.current_ads = ad_break.ads();
            state.current_ad_break = Some(ad_break.clone());
        });
    }

    pub fn begin_ad(&self, ad: Arc<Ad>) {
        self.ad_event(AdEventType::Begin, ad, |state, ad| {
            if !state.current_ads.iter().any(|a| a.native_id() == ad.native_id()) {
                state.current_ads.push(ad.clone());
            }
        });
    }

    pub fn end_ad(&self, ad: Arc<Ad>) {
        self.ad_event(AdEventType::End, ad, |state, ad| {
            state.current_ads.retain(|a| a.native_id() != ad.native_id());
        });
    }

    pub fn end_ad_break(&self, ad_break: Arc<AdBreak>) {
        self.break_event(AdBreakEventType::End, ad_break, |state, ad_break| {
            state.current_ads.clear();
            state.current_ad_break = None;
            state
                .scheduled_ad_breaks
                .retain(|b| b.native_id() != ad_break.native_id());
        });
    }

    /// Drop a break from the schedule (played, expired or cancelled)
    pub fn remove_ad_break(&self, ad_break: Arc<AdBreak>) {
        self.break_event(AdBreakEventType::RemoveAdBreak, ad_break, |state, ad_break| {
            state
                .scheduled_ad_breaks
                .retain(|b| b.native_id() != ad_break.native_id());
            if state
                .current_ad_break
                .as_ref()
                .is_some_and(|b| b.native_id() == ad_break.native_id())
            {
                state.current_ad_break = None;
                state.current_ads.clear();
            }
        });
    }

    /// Emit an ad event that carries no state change (quartiles, clicks, ...)
    pub fn emit_ad(&self, kind: AdEventType, ad: Arc<Ad>) {
        self.ad_event(kind, ad, |_, _| {});
    }

    pub fn emit_break(&self, kind: AdBreakEventType, ad_break: Arc<AdBreak>) {
        self.break_event(kind, ad_break, |_, _| {});
    }

    fn ad_event(&self, kind: AdEventType, ad: Arc<Ad>, update: impl FnOnce(&mut AdsState, &Arc<Ad>)) {
        let target = ad.clone();
        self.events.dispatch_after(
            || update(&mut lock(&self.state), &target),
            &AdsEvent::Ad { kind, ad },
        );
    }

    fn break_event(
        &self,
        kind: AdBreakEventType,
        ad_break: Arc<AdBreak>,
        update: impl FnOnce(&mut AdsState, &Arc<AdBreak>),
    ) {
        let target = ad_break.clone();
        self.events.dispatch_after(
            || update(&mut lock(&self.state), &target),
            &AdsEvent::AdBreak { kind, ad_break },
        );
    }
}

impl Default for Ads {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_ads_follow_break_order() {
        let ads = Ads::new();
        let first = Arc::new(AdBreak::new("csai", 0.0));
        let second = Arc::new(AdBreak::new("csai", 30.0));
        ads.schedule_ad_break(first.clone());
        ads.schedule_ad_break(second.clone());

        let a = Arc::new(Ad::new("a", "csai"));
        let b = Arc::new(Ad::new("b", "csai"));
        ads.add_ad(&second, b.clone());
        ads.add_ad(&first, a.clone());

        let ids: Vec<String> = ads.scheduled_ads().iter().map(|ad| ad.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(a.ad_break(), Some(first.native_id()));
    }

    #[test]
    fn test_break_lifecycle_updates_state_before_dispatch() {
        let ads = Arc::new(Ads::new());
        let ad_break = Arc::new(AdBreak::new("csai", 0.0));
        ads.schedule_ad_break(ad_break.clone());
        ads.add_ad(&ad_break, Arc::new(Ad::new("a", "csai")));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = observed.clone();
        let reader = ads.clone();
        ads.events().add_listener(move |event| {
            if let AdsEvent::AdBreak { kind, .. } = event {
                sink.lock()
                    .unwrap()
                    .push((*kind, reader.current_ads().len(), reader.current_ad_break().is_some()));
            }
        });

        ads.begin_ad_break(ad_break.clone());
        ads.end_ad_break(ad_break);

        assert_eq!(
            *observed.lock().unwrap(),
            vec![
                (AdBreakEventType::Begin, 1, true),
                (AdBreakEventType::End, 0, false)
            ]
        );
        assert!(ads.scheduled_ad_breaks().is_empty());
    }

    #[test]
    fn test_observe_replays_schedule() {
        let ads = Ads::new();
        let ad_break = Arc::new(AdBreak::new("csai", 0.0));
        ads.schedule_ad_break(ad_break.clone());
        ads.add_ad(&ad_break, Arc::new(Ad::new("a", "csai")));
        ads.add_ad(&ad_break, Arc::new(Ad::new("b", "csai")));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ads.observe(move |event| {
            let tag = match event {
                AdsEvent::Ad { kind, ad } => format!("{:?}:{}", kind, ad.id),
                AdsEvent::AdBreak { kind, .. } => format!("{:?}", kind),
            };
            sink.lock().unwrap().push(tag);
        });
        ads.begin_ad_break(ad_break);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["AddAdBreak", "AddAd:a", "AddAd:b", "Begin"]
        );
    }
}
