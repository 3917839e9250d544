//! 投票分类器
//!
//! 检测器逐帧给出的类别有噪声,累计观测达到稳定帧数后以多数票确认一次

use std::collections::HashMap;

use crate::config::Grade;
use crate::ring::Ring;

use super::track::Track;

/// 稳定多数投票
///
/// 平票时取按插入顺序最先达到最高票数的标签
pub fn majority_vote(history: &Ring<String>) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best: Option<(&str, usize)> = None;
    for label in history.iter() {
        let count = counts.entry(label.as_str()).or_insert(0);
        *count += 1;
        if best.map_or(true, |(_, n)| *count > n) {
            best = Some((label.as_str(), *count));
        }
    }
    best.map(|(label, _)| label)
}

/// 一次确认的结果
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub class_name: String,
    pub grade: Grade,
}

#[derive(Clone, Copy, Debug)]
pub struct VotingClassifier {
    stability_frames: u32,
}

impl VotingClassifier {
    pub fn new(stability_frames: u32) -> Self {
        Self { stability_frames }
    }

    /// 满足条件时确认类别,返回本次确认结果; 已确认或帧数不足返回 None
    pub fn classify(&self, track: &mut Track, grade: impl Fn(&str) -> Grade) -> Option<Verdict> {
        if track.is_counted() || track.frames_seen < self.stability_frames {
            return None;
        }
        let class_name = majority_vote(&track.class_history)?.to_string();
        track.confirm(class_name.clone());
        Some(Verdict {
            grade: grade(&class_name),
            class_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BBox, Detection};

    fn ring(labels: &[&str]) -> Ring<String> {
        let mut ring = Ring::new(labels.len());
        for label in labels {
            ring.push(label.to_string());
        }
        ring
    }

    fn grade(class_name: &str) -> Grade {
        match class_name {
            "A" => Grade::Good,
            "Black" => Grade::Bad,
            _ => Grade::Unknown,
        }
    }

    #[test]
    fn test_tie_goes_to_first_to_reach_max() {
        assert_eq!(majority_vote(&ring(&["A", "B", "A", "B", "C"])), Some("A"));
        // B 先出现,但 A 先达到2票
        assert_eq!(majority_vote(&ring(&["B", "A", "A", "B"])), Some("A"));
    }

    #[test]
    fn test_clear_majority() {
        assert_eq!(majority_vote(&ring(&["C", "B", "B", "A", "B"])), Some("B"));
        assert_eq!(majority_vote(&ring(&[])), None);
    }

    #[test]
    fn test_confirms_once_after_stability() {
        let classifier = VotingClassifier::new(5);
        let mut track = Track::new(1, 0, 5);
        let det = |c: &str| Detection::new(1, c, 0.9, BBox::new(0.0, 0.0, 10.0, 10.0));

        for (i, c) in ["Black", "A", "Black", "Black"].iter().enumerate() {
            track.observe(&det(c), i as u64);
            assert_eq!(classifier.classify(&mut track, grade), None);
        }

        track.observe(&det("A"), 4);
        let verdict = classifier.classify(&mut track, grade).unwrap();
        assert_eq!(verdict.class_name, "Black");
        assert_eq!(verdict.grade, Grade::Bad);

        for i in 5..12 {
            track.observe(&det("A"), i);
            assert_eq!(classifier.classify(&mut track, grade), None);
        }
        assert_eq!(track.confirmed_class(), Some("Black"));
    }
}
