//! 跟踪对象注册表
//!
//! 以上游ID为键,按ID升序遍历 (去重与发射扫描的确定性顺序)

use std::collections::BTreeMap;

use crate::detection::{Detection, ObjectId};

use super::track::Track;

pub struct TrackRegistry {
    tracks: BTreeMap<ObjectId, Track>,
    history_capacity: usize,
}

impl TrackRegistry {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            tracks: BTreeMap::new(),
            history_capacity,
        }
    }

    /// 更新或新建跟踪对象,不会删除任何对象
    pub fn upsert(&mut self, detection: &Detection, now: u64) -> &mut Track {
        let capacity = self.history_capacity;
        let track = self
            .tracks
            .entry(detection.id)
            .or_insert_with(|| Track::new(detection.id, now, capacity));
        track.observe(detection, now);
        track
    }

    pub fn get(&self, id: ObjectId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// 按ID升序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<Track> {
        self.tracks.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BBox;

    fn det(id: ObjectId, class_name: &str) -> Detection {
        Detection::new(id, class_name, 0.9, BBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_upsert_creates_once() {
        let mut registry = TrackRegistry::new(5);
        registry.upsert(&det(3, "A"), 10);
        registry.upsert(&det(3, "A"), 40);

        assert_eq!(registry.len(), 1);
        let track = registry.get(3).unwrap();
        assert_eq!(track.first_seen_at, 10);
        assert_eq!(track.last_seen_at, 40);
        assert_eq!(track.frames_seen, 2);
    }

    #[test]
    fn test_history_keeps_latest_k() {
        let mut registry = TrackRegistry::new(5);
        for (i, class_name) in ["c0", "c1", "c2", "c3", "c4", "c5", "c6"].iter().enumerate() {
            registry.upsert(&det(1, class_name), i as u64);
        }
        let history: Vec<_> = registry.get(1).unwrap().class_history.iter().cloned().collect();
        assert_eq!(history, vec!["c2", "c3", "c4", "c5", "c6"]);
    }

    #[test]
    fn test_iterates_in_ascending_id() {
        let mut registry = TrackRegistry::new(5);
        for id in [42, 7, 19] {
            registry.upsert(&det(id, "A"), 0);
        }
        let ids: Vec<_> = registry.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 19, 42]);
    }
}
