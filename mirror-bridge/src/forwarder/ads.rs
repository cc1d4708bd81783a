//! Ads and ad breaks
//!
//! Every ad and ad-break call carries the complete ads state as seen at
//! emission time ([`AdsSnapshot`]). The remote never has to merge diffs, and
//! losing any single call costs nothing once the next one arrives.

use std::sync::{Arc, Weak};

use mirror_common::protocol::{
    AdBreakCall, AdBreakEventType, AdBreakPayload, AdCall, AdPayload, AdsSnapshot,
};
use mirror_common::Uid;
use tracing::debug;

use super::ForwarderContext;
use crate::binding::ListenerBinding;
use crate::engine::{Ad, AdBreak, Ads, AdsEvent, NativeEntity, Player};
use crate::registry::{EntityRef, EntityRegistry};

/// Forwards ad lifecycle events (`onAd*`, `onAddAd`)
///
/// Events for an ad whose break is no longer known (removed, or never
/// scheduled nor begun) are dropped: the break's removal already released
/// the ad's UID.
pub struct AdForwarder {
    binding: ListenerBinding,
}

impl AdForwarder {
    pub fn attach(player: &Arc<Player>, ctx: ForwarderContext) -> Self {
        let weak = Arc::downgrade(player);
        let binding = observe(player, move |event| {
            let AdsEvent::Ad { kind, ad } = event else {
                return;
            };
            let Some(player) = weak.upgrade() else {
                return;
            };
            let builder = SnapshotBuilder::new(&ctx.registry, player.ads());
            let Some(payload) = builder.ad(ad) else {
                debug!("Dropping {:?} for ad {} outside a live ad break", kind, ad.id);
                return;
            };
            let body = AdCall {
                ad: payload,
                snapshot: builder.snapshot(),
            };
            ctx.transport.send(kind.into_call(body));
        });
        Self { binding }
    }

    pub fn detach(&self) {
        self.binding.detach();
    }
}

/// Forwards ad break events (`onAdBreak*`, `onAddAdBreak`, `onRemoveAdBreak`)
///
/// A removed break is released together with its ads once the removal has
/// been sent.
pub struct AdBreakForwarder {
    binding: ListenerBinding,
}

impl AdBreakForwarder {
    pub fn attach(player: &Arc<Player>, ctx: ForwarderContext) -> Self {
        let weak: Weak<Player> = Arc::downgrade(player);
        let binding = observe(player, move |event| {
            let AdsEvent::AdBreak { kind, ad_break } = event else {
                return;
            };
            let Some(player) = weak.upgrade() else {
                return;
            };
            let builder = SnapshotBuilder::new(&ctx.registry, player.ads());
            let payload = builder.ad_break(ad_break);
            let uid = payload.uid;
            let body = AdBreakCall {
                ad_break: payload,
                snapshot: builder.snapshot(),
            };
            ctx.transport.send(kind.into_call(body));

            if *kind == AdBreakEventType::RemoveAdBreak {
                debug!("Releasing ad break {}", uid);
                ctx.release_tree(uid);
            }
        });
        Self { binding }
    }

    pub fn detach(&self) {
        self.binding.detach();
    }
}

fn observe<F>(player: &Player, listener: F) -> ListenerBinding
where
    F: Fn(&AdsEvent) + Send + Sync + 'static,
{
    let events = player.ads().events();
    ListenerBinding::with_listener(events, player.ads().observe(listener))
}

/// Builds payloads for the current ads state, registering what it meets
struct SnapshotBuilder<'a> {
    registry: &'a EntityRegistry,
    ads: &'a Ads,
    known_breaks: Vec<Arc<AdBreak>>,
}

impl<'a> SnapshotBuilder<'a> {
    fn new(registry: &'a EntityRegistry, ads: &'a Ads) -> Self {
        let mut known_breaks = ads.scheduled_ad_breaks();
        if let Some(current) = ads.current_ad_break() {
            if !known_breaks
                .iter()
                .any(|b| b.native_id() == current.native_id())
            {
                known_breaks.push(current);
            }
        }
        Self {
            registry,
            ads,
            known_breaks,
        }
    }

    fn break_uid(&self, ad: &Ad) -> Option<Uid> {
        let native_id = ad.ad_break()?;
        if let Some(uid) = self.registry.uid_of(native_id) {
            return Some(uid);
        }
        let ad_break = self
            .known_breaks
            .iter()
            .find(|b| b.native_id() == native_id)?;
        Some(
            self.registry
                .register_or_get(EntityRef::AdBreak(ad_break.clone()), None),
        )
    }

    /// `None` when the ad has no registered or known break
    fn ad(&self, ad: &Arc<Ad>) -> Option<AdPayload> {
        let ad_break_uid = self.break_uid(ad)?;
        let uid = self
            .registry
            .register_or_get(EntityRef::Ad(ad.clone()), Some(ad_break_uid));
        Some(AdPayload {
            uid,
            id: ad.id.clone(),
            integration: ad.integration.clone(),
            ad_type: ad.ad_type.clone(),
            duration: ad.duration,
            skip_offset: ad.skip_offset,
            ad_break_uid: Some(ad_break_uid),
        })
    }

    fn ad_break(&self, ad_break: &Arc<AdBreak>) -> AdBreakPayload {
        let uid = self
            .registry
            .register_or_get(EntityRef::AdBreak(ad_break.clone()), None);
        AdBreakPayload {
            uid,
            integration: ad_break.integration.clone(),
            time_offset: ad_break.time_offset,
            max_duration: ad_break.max_duration,
            ads: ad_break.ads().iter().filter_map(|ad| self.ad(ad)).collect(),
        }
    }

    fn snapshot(&self) -> AdsSnapshot {
        AdsSnapshot {
            current_ads: self
                .ads
                .current_ads()
                .iter()
                .filter_map(|ad| self.ad(ad))
                .collect(),
            current_ad_break: self.ads.current_ad_break().map(|b| self.ad_break(&b)),
            scheduled_ads: self
                .ads
                .scheduled_ads()
                .iter()
                .filter_map(|ad| self.ad(ad))
                .collect(),
        }
    }
}
