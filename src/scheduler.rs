//! Read/notify scheduling.
//!
//! The transport supports exactly one outstanding GATT operation, so every
//! completion asks the scheduler what to do next: drain the pending
//! notification queue first, otherwise rotate the polling queue one step.
//! Notifications are one-shot commands, so they pre-empt without starving
//! the rotation.

use std::collections::VecDeque;

use crate::ble::characteristic::Characteristic;

/// The next operation to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledOp {
    /// Write this buffer to the inbound alert characteristic.
    Notification(Vec<u8>),
    /// Read this characteristic.
    Read(Characteristic),
}

/// Round-robin read scheduler with a priority notification queue.
///
/// Owned by a single device session; rebuilt queue contents never migrate
/// between sessions.
#[derive(Debug, Default)]
pub struct Scheduler {
    polling: VecDeque<Characteristic>,
    notifications: VecDeque<Vec<u8>>,
}

impl Scheduler {
    /// Create an empty scheduler. The polling queue stays empty until the
    /// first mode observation triggers [`Scheduler::rebuild_polling_queue`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the polling queue to its canonical content and order.
    ///
    /// The mode characteristic leads so mode changes are picked up during
    /// rotation, followed by every reading characteristic. The rebuild is
    /// total: any previous rotation position is discarded.
    pub fn rebuild_polling_queue(&mut self) {
        self.polling.clear();
        self.polling.push_back(Characteristic::Mode);
        self.polling.extend(Characteristic::READINGS);
    }

    /// Queue a raw command buffer for transmission to the alert channel.
    pub fn enqueue_notification(&mut self, buffer: Vec<u8>) {
        self.notifications.push_back(buffer);
    }

    /// Pick the next operation.
    ///
    /// Pending notifications win; otherwise the polling queue head is rotated
    /// to the tail and returned. `None` means there is nothing to do.
    pub fn next_operation(&mut self) -> Option<ScheduledOp> {
        if let Some(buffer) = self.notifications.pop_front() {
            return Some(ScheduledOp::Notification(buffer));
        }

        let characteristic = self.polling.pop_front()?;
        self.polling.push_back(characteristic);
        Some(ScheduledOp::Read(characteristic))
    }

    /// Number of entries in the polling rotation.
    pub fn polling_len(&self) -> usize {
        self.polling.len()
    }

    /// Whether any notification is waiting for transmission.
    pub fn has_pending_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    /// Drop all queued work. Used on session teardown.
    pub fn clear(&mut self) {
        self.polling.clear();
        self.notifications.clear();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::HashMap;

    use super::*;

    fn reads(scheduler: &mut Scheduler, count: usize) -> Vec<Characteristic> {
        (0..count)
            .map(|_| match scheduler.next_operation() {
                Some(ScheduledOp::Read(characteristic)) => characteristic,
                other => panic!("expected a read, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_empty_scheduler_is_idle() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_operation(), None);
    }

    #[test]
    fn test_canonical_queue_content() {
        let mut scheduler = Scheduler::new();
        scheduler.rebuild_polling_queue();

        assert_eq!(scheduler.polling_len(), 12);
        let visited = reads(&mut scheduler, 12);
        assert_eq!(visited[0], Characteristic::Mode);
        assert_eq!(&visited[1..], &Characteristic::READINGS);
    }

    #[test]
    fn test_rotation_visits_every_member_before_repeating() {
        let mut scheduler = Scheduler::new();
        scheduler.rebuild_polling_queue();
        let len = scheduler.polling_len();

        let first_cycle = reads(&mut scheduler, len);
        let second_cycle = reads(&mut scheduler, len);

        for characteristic in Characteristic::READINGS {
            assert_eq!(
                first_cycle.iter().filter(|&&c| c == characteristic).count(),
                1
            );
        }
        assert_eq!(first_cycle, second_cycle);
    }

    #[test]
    fn test_notification_preempts_polling() {
        let mut scheduler = Scheduler::new();
        scheduler.rebuild_polling_queue();

        // Advance partway through the rotation.
        let before = reads(&mut scheduler, 3);
        scheduler.enqueue_notification(vec![1, 2, 0xAB]);

        assert_eq!(
            scheduler.next_operation(),
            Some(ScheduledOp::Notification(vec![1, 2, 0xAB]))
        );

        // The rotation resumes exactly where it left off.
        let after = reads(&mut scheduler, 12);
        assert!(!before.contains(&after[0]));
        assert_eq!(after[9], Characteristic::Mode);
    }

    #[test]
    fn test_notifications_drain_in_fifo_order() {
        let mut scheduler = Scheduler::new();
        scheduler.rebuild_polling_queue();
        scheduler.enqueue_notification(vec![1]);
        scheduler.enqueue_notification(vec![2]);

        assert_eq!(
            scheduler.next_operation(),
            Some(ScheduledOp::Notification(vec![1]))
        );
        assert_eq!(
            scheduler.next_operation(),
            Some(ScheduledOp::Notification(vec![2]))
        );
        assert!(matches!(
            scheduler.next_operation(),
            Some(ScheduledOp::Read(_))
        ));
    }

    #[test]
    fn test_rebuild_resets_rotation_position() {
        let mut scheduler = Scheduler::new();
        scheduler.rebuild_polling_queue();
        reads(&mut scheduler, 5);

        scheduler.rebuild_polling_queue();
        let visited = reads(&mut scheduler, 1);
        assert_eq!(visited[0], Characteristic::Mode);
    }

    #[test]
    fn test_clear_empties_both_queues() {
        let mut scheduler = Scheduler::new();
        scheduler.rebuild_polling_queue();
        scheduler.enqueue_notification(vec![1]);

        scheduler.clear();
        assert_eq!(scheduler.polling_len(), 0);
        assert!(!scheduler.has_pending_notifications());
        assert_eq!(scheduler.next_operation(), None);
    }

    proptest! {
        // Fairness: over any run length, visit counts never diverge by more
        // than one, and notifications never perturb the rotation order.
        #[test]
        fn prop_rotation_is_fair(steps in 1usize..200, notify_at in proptest::collection::vec(0usize..200, 0..8)) {
            let mut scheduler = Scheduler::new();
            scheduler.rebuild_polling_queue();

            let mut counts: HashMap<Characteristic, usize> = HashMap::new();
            for step in 0..steps {
                if notify_at.contains(&step) {
                    scheduler.enqueue_notification(vec![step as u8]);
                }
                loop {
                    match scheduler.next_operation() {
                        Some(ScheduledOp::Notification(_)) => continue,
                        Some(ScheduledOp::Read(characteristic)) => {
                            *counts.entry(characteristic).or_default() += 1;
                            break;
                        }
                        None => panic!("rotation must never run dry"),
                    }
                }
            }

            let max = counts.values().copied().max().unwrap_or(0);
            let min = if counts.len() == 12 {
                counts.values().copied().min().unwrap_or(0)
            } else {
                0
            };
            prop_assert!(max - min <= 1);
        }
    }
}
