//! Behavior state replication.

use crate::actor::World;
use crate::behavior::BehaviorOverride;
use crate::net::{NetError, NetMode, PacketReader, PacketWriter, SyncPacket};

use super::{Encounter, tick_env};

impl Encounter {
    /// Serialize every behavior with unsent changes and mark it synced.
    /// Replicas never send.
    pub fn collect_dirty(&mut self) -> Vec<SyncPacket> {
        if self.mode == NetMode::Replica {
            return Vec::new();
        }

        let mut packets = Vec::new();
        for id in self.registry.dirty_ids() {
            let Some(kind) = self.registry.kind_of(id) else {
                continue;
            };
            let Some(behavior) = self.registry.behavior_mut(id) else {
                continue;
            };
            let mut writer = PacketWriter::new();
            behavior.write_state(&mut writer);
            behavior.mark_synced();
            packets.push(SyncPacket {
                actor: id,
                kind,
                payload: writer.finish(),
            });
        }
        if !packets.is_empty() {
            tracing::debug!(count = packets.len(), tick = self.tick, "Collected sync packets");
        }
        packets
    }

    /// Apply a packet from the authority.
    ///
    /// Actors this side never saw spawn are bound on first contact without
    /// running their spawn hook. A handle now carrying a different type is
    /// released first. A packet that fails to decode leaves the behavior
    /// untouched, which for a freshly bound one means template defaults.
    pub fn receive_sync<W: World>(&mut self, world: &W, packet: &SyncPacket) -> Result<(), NetError> {
        if let Some(bound) = self.registry.kind_of(packet.actor) {
            if bound != packet.kind {
                let mut env = tick_env!(self);
                if let Some(report) = self.registry.on_actor_destroyed(world, &mut env, packet.actor) {
                    self.kills.push(report);
                }
            }
        }

        let Some(behavior) = self.registry.bind_replica(packet.actor, packet.kind) else {
            tracing::debug!(actor = %packet.actor, kind = %packet.kind, "No template for synced actor");
            return Ok(());
        };

        let mut reader = PacketReader::new(packet.payload.clone());
        if let Err(err) = behavior.read_state(&mut reader) {
            tracing::warn!(actor = %packet.actor, error = %err, "Discarding malformed sync packet");
            return Err(err);
        }
        Ok(())
    }
}
