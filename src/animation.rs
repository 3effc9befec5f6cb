use macroquad::prelude::*;
use serde::Deserialize;
use std::path::Path;
use std::rc::Rc;

use crate::config::LoadError;
use crate::helpers::{merge_rect, rect_from_array};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    /// Drawn area relative to the sprite origin.
    pub bounding_box: Rect,
    pub collision_box: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameSequence {
    pub name: String,
    pub frames: Vec<Frame>,
    /// Frame to jump back to after the last one, `None` to hold the last frame.
    pub loop_from: Option<usize>,
}

impl FrameSequence {
    pub fn new(name: &str, frames: Vec<Frame>) -> Self {
        Self {
            name: name.to_string(),
            frames,
            loop_from: None,
        }
    }

    /// `count` identical frames.
    pub fn uniform(name: &str, count: usize, bounding_box: Rect, collision_box: Rect) -> Self {
        Self::new(
            name,
            vec![
                Frame {
                    bounding_box,
                    collision_box,
                };
                count
            ],
        )
    }

    pub fn looping_from(mut self, frame: usize) -> Self {
        self.loop_from = Some(frame);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteSheet {
    pub name: String,
    sequences: Vec<FrameSequence>,
}

impl SpriteSheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sequences: Vec::new(),
        }
    }

    pub fn with_sequence(mut self, sequence: FrameSequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        let parsed: SpriteSheetFile = serde_json::from_str(content)?;
        let sequences = parsed
            .sequences
            .into_iter()
            .map(|sequence| FrameSequence {
                name: sequence.name,
                frames: sequence
                    .frames
                    .into_iter()
                    .map(|frame| Frame {
                        bounding_box: rect_from_array(frame.bounding_box),
                        collision_box: rect_from_array(frame.collision_box),
                    })
                    .collect(),
                loop_from: sequence.loop_from,
            })
            .collect();
        Ok(Self {
            name: parsed.name,
            sequences,
        })
    }

    pub fn sequences(&self) -> &[FrameSequence] {
        &self.sequences
    }

    pub fn sequence(&self, name: &str) -> Option<usize> {
        self.sequences.iter().position(|sequence| sequence.name == name)
    }
}

/// Creation parameters a sprite may rewrite before a slot is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationRequest {
    pub sequence: String,
    pub initial_frame: usize,
    pub start_visible: bool,
    pub start_on: bool,
}

/// Playback state of one frame sequence.
#[derive(Clone, Debug)]
pub struct Animation {
    index: usize,
    sheet: Rc<SpriteSheet>,
    sequence: usize,
    initial_frame: usize,
    current: usize,
    animating: bool,
    visible: bool,
    mirrored: bool,
    end_fired: bool,
}

impl Animation {
    pub fn new(
        index: usize,
        sheet: Rc<SpriteSheet>,
        sequence: usize,
        request: &AnimationRequest,
        mirrored: bool,
    ) -> Self {
        Self {
            index,
            sheet,
            sequence,
            initial_frame: request.initial_frame,
            current: request.initial_frame,
            animating: request.start_on,
            visible: request.start_visible,
            mirrored,
            end_fired: false,
        }
    }

    fn frames(&self) -> &[Frame] {
        self.sheet
            .sequences
            .get(self.sequence)
            .map(|sequence| sequence.frames.as_slice())
            .unwrap_or(&[])
    }

    fn loop_from(&self) -> Option<usize> {
        self.sheet.sequences.get(self.sequence).and_then(|sequence| sequence.loop_from)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sequence_name(&self) -> &str {
        self.sheet
            .sequences
            .get(self.sequence)
            .map(|sequence| sequence.name.as_str())
            .unwrap_or("")
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Clamped to the last frame of the sequence.
    pub fn set_current_frame(&mut self, frame: usize) {
        self.current = frame.min(self.frames().len().saturating_sub(1));
        self.end_fired = false;
    }

    pub fn start(&mut self, from: Option<usize>) {
        self.end_fired = false;
        self.animating = true;
        if let Some(offset) = from {
            self.current = self.initial_frame + offset;
        }
    }

    pub fn start_from_begin(&mut self) {
        self.start(Some(0));
    }

    pub fn stop(&mut self) {
        self.animating = false;
    }

    pub fn animating(&self) -> bool {
        self.animating
    }

    pub fn set_animating(&mut self, animating: bool) {
        if animating && !self.animating {
            self.start(None);
        } else if !animating && self.animating {
            self.stop();
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn current_bounding_box(&self) -> Rect {
        self.frames()
            .get(self.current)
            .map(|frame| frame.bounding_box)
            .unwrap_or_default()
    }

    pub fn current_collision_box(&self) -> Rect {
        self.frames()
            .get(self.current)
            .map(|frame| frame.collision_box)
            .unwrap_or_default()
    }

    /// Advances one frame. Returns true when the sequence end was reached
    /// on this call.
    pub fn on_frame(&mut self) -> bool {
        let count = self.frames().len();
        if !self.animating || self.end_fired || count == 0 {
            return false;
        }

        self.current += 1;
        if self.current < count {
            return false;
        }

        self.current = count - 1;
        self.end_fired = true;
        if let Some(loop_from) = self.loop_from() {
            self.current = loop_from.min(count - 1);
            self.end_fired = false;
        }
        true
    }
}

/// All animation slots of a sprite and which one is active.
#[derive(Clone, Debug, Default)]
pub struct AnimationSet {
    slots: Vec<Animation>,
    active: Option<usize>,
}

impl AnimationSet {
    pub fn push(&mut self, animation: Animation) {
        self.slots.push(animation);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Animation> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Animation> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.slots.iter()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Animation> {
        self.slots.get(self.active?)
    }

    pub fn active_mut(&mut self) -> Option<&mut Animation> {
        self.slots.get_mut(self.active?)
    }

    /// Makes `index` the visible slot. Playback state and frame carry over
    /// from the previously active slot, which is stopped and hidden. With no
    /// previous slot the new one starts stopped on its first frame.
    pub fn switch_to(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }

        let (animating, frame) = match self.active_mut() {
            Some(previous) => {
                let state = (previous.animating(), previous.current_frame());
                previous.stop();
                previous.set_visible(false);
                state
            }
            None => (false, 0),
        };

        self.active = Some(index);
        let next = &mut self.slots[index];
        next.set_current_frame(frame);
        next.set_animating(animating);
        next.set_visible(true);
        true
    }

    /// Steps every slot and returns the ones whose sequence ended.
    pub fn on_frame(&mut self) -> Vec<usize> {
        self.slots
            .iter_mut()
            .filter_map(|animation| animation.on_frame().then_some(animation.index()))
            .collect()
    }

    pub fn current_collision_box(&self) -> Rect {
        self.active()
            .map(Animation::current_collision_box)
            .unwrap_or_default()
    }

    /// Union of the visible slots' frame boxes.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.slots
            .iter()
            .filter(|animation| animation.visible())
            .map(Animation::current_bounding_box)
            .reduce(merge_rect)
    }
}

#[derive(Deserialize)]
struct SpriteSheetFile {
    name: String,
    #[serde(default)]
    sequences: Vec<FrameSequenceFile>,
}

#[derive(Deserialize)]
struct FrameSequenceFile {
    name: String,
    #[serde(default)]
    frames: Vec<FrameFile>,
    #[serde(default)]
    loop_from: Option<usize>,
}

#[derive(Deserialize)]
struct FrameFile {
    #[serde(default)]
    bounding_box: [f32; 4],
    #[serde(default)]
    collision_box: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Rc<SpriteSheet> {
        let bbox = Rect::new(-4.0, -4.0, 8.0, 8.0);
        Rc::new(
            SpriteSheet::new("test")
                .with_sequence(FrameSequence::uniform("Walk", 4, bbox, bbox).looping_from(1))
                .with_sequence(FrameSequence::uniform("Hit", 2, bbox, Rect::new(0.0, 0.0, 2.0, 2.0))),
        )
    }

    fn request(name: &str, start_on: bool) -> AnimationRequest {
        AnimationRequest {
            sequence: name.to_string(),
            initial_frame: 0,
            start_visible: false,
            start_on,
        }
    }

    fn set() -> AnimationSet {
        let sheet = sheet();
        let mut set = AnimationSet::default();
        set.push(Animation::new(0, sheet.clone(), 0, &request("Walk", false), false));
        set.push(Animation::new(1, sheet, 1, &request("Hit", false), false));
        set
    }

    #[test]
    fn loads_sheet_from_json() {
        let sheet = SpriteSheet::from_json(
            r#"{
                "name": "lemon",
                "sequences": [
                    { "name": "Shot", "frames": [ { "bounding_box": [-4, -4, 8, 8] } ], "loop_from": 0 },
                    { "name": "ShotHit", "frames": [ {}, {} ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(sheet.sequences().len(), 2);
        assert_eq!(sheet.sequence("ShotHit"), Some(1));
        assert_eq!(sheet.sequences()[0].loop_from, Some(0));
        assert_eq!(sheet.sequences()[0].frames[0].bounding_box, Rect::new(-4.0, -4.0, 8.0, 8.0));
        assert!(matches!(SpriteSheet::from_json("{"), Err(LoadError::Json(_))));
    }

    #[test]
    fn first_switch_starts_stopped_at_frame_zero() {
        let mut set = set();
        assert!(set.switch_to(1));
        let active = set.active().unwrap();
        assert!(active.visible());
        assert!(!active.animating());
        assert_eq!(active.current_frame(), 0);
        assert!(!set.switch_to(7));
    }

    #[test]
    fn switch_carries_playback_and_frame() {
        let mut set = set();
        set.switch_to(0);
        set.active_mut().unwrap().start_from_begin();
        set.on_frame();
        assert_eq!(set.active().unwrap().current_frame(), 1);

        set.switch_to(1);
        let old = set.get(0).unwrap();
        assert!(!old.animating());
        assert!(!old.visible());
        let new = set.active().unwrap();
        assert!(new.animating());
        assert!(new.visible());
        assert_eq!(new.current_frame(), 1);
    }

    #[test]
    fn switch_clamps_frame_to_shorter_sequence() {
        let mut set = set();
        set.switch_to(0);
        set.get_mut(0).unwrap().set_current_frame(3);
        set.switch_to(1);
        assert_eq!(set.active().unwrap().current_frame(), 1);
    }

    #[test]
    fn end_fires_once_for_non_looping() {
        let mut set = set();
        set.switch_to(1);
        set.active_mut().unwrap().start_from_begin();
        assert!(set.on_frame().is_empty());
        assert_eq!(set.on_frame(), vec![1]);
        assert!(set.on_frame().is_empty());
        assert_eq!(set.active().unwrap().current_frame(), 1);
    }

    #[test]
    fn looping_sequence_wraps() {
        let mut set = set();
        set.switch_to(0);
        set.active_mut().unwrap().start_from_begin();
        let mut ended = 0;
        for _ in 0..4 {
            ended += set.on_frame().len();
        }
        assert_eq!(ended, 1);
        assert_eq!(set.active().unwrap().current_frame(), 1);
    }

    #[test]
    fn collision_box_follows_active_slot() {
        let mut set = set();
        assert_eq!(set.current_collision_box(), Rect::default());
        set.switch_to(1);
        assert_eq!(set.current_collision_box(), Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(set.bounding_box(), Some(Rect::new(-4.0, -4.0, 8.0, 8.0)));
    }
}
