use nalgebra::{Rotation3, Vector3};
use serde::Serialize;
use tracing::debug;

use crate::error::ModelError;
use crate::frame::Frame;
use crate::panel::Panel;

/// How panel frames are owned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Layout {
    /// Every panel carries its own laboratory frame.
    Flat,
    /// Panel frames are expressed relative to a single root frame; moving the
    /// root moves the whole assembly rigidly.
    Hierarchy { root: Frame },
}

/// An ordered set of panels. Panel index is identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detector {
    panels: Vec<Panel>,
    layout: Layout,
}

impl Detector {
    /// A detector whose panels each carry their own laboratory frame.
    pub fn new(panels: Vec<Panel>) -> Self {
        Self {
            panels,
            layout: Layout::Flat,
        }
    }

    /// A detector whose panel frames are given relative to `root`.
    pub fn with_hierarchy(root: Frame, panels: Vec<Panel>) -> Self {
        let mut detector = Self {
            panels,
            layout: Layout::Hierarchy { root },
        };
        detector.refresh_panels();
        detector
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn hierarchy(&self) -> Option<&Frame> {
        match &self.layout {
            Layout::Hierarchy { root } => Some(root),
            Layout::Flat => None,
        }
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Panel> {
        self.panels.iter()
    }

    pub fn panel(&self, index: usize) -> Result<&Panel, ModelError> {
        self.panels.get(index).ok_or(ModelError::PanelIndexOutOfRange {
            index,
            len: self.panels.len(),
        })
    }

    /// Place a panel at a laboratory frame. Under a hierarchy the panel's
    /// local frame is updated so that the root stays where it is.
    pub fn set_panel_frame(&mut self, index: usize, frame: Frame) -> Result<(), ModelError> {
        let len = self.panels.len();
        let local = match &self.layout {
            Layout::Hierarchy { root } => root.relative(&frame),
            Layout::Flat => frame,
        };
        let panel = self
            .panels
            .get_mut(index)
            .ok_or(ModelError::PanelIndexOutOfRange { index, len })?;
        panel.set_frames(frame, local);
        Ok(())
    }

    /// Move the hierarchy root. Returns `false` for flat detectors, which
    /// have no root to move.
    pub fn set_root_frame(&mut self, frame: Frame) -> bool {
        match &mut self.layout {
            Layout::Hierarchy { root } => {
                *root = frame;
                self.refresh_panels();
                true
            }
            Layout::Flat => false,
        }
    }

    /// Apply a frame mapping to whatever owns the detector position: the root
    /// when a hierarchy exists, otherwise every panel independently.
    pub fn apply_frame_delta<F>(&mut self, delta: F)
    where
        F: Fn(&Frame) -> Frame,
    {
        match &mut self.layout {
            Layout::Hierarchy { root } => {
                let moved = delta(root);
                *root = moved;
                self.refresh_panels();
            }
            Layout::Flat => {
                for panel in &mut self.panels {
                    let moved = delta(panel.frame());
                    panel.set_frames(moved, moved);
                }
            }
        }
    }

    pub fn translate(&mut self, shift: &Vector3<f64>) {
        self.apply_frame_delta(|f| f.translated(shift));
    }

    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        self.apply_frame_delta(|f| f.rotated(rotation));
    }

    /// Index of the nearest panel hit by a forward ray from the laboratory
    /// origin inside its image area.
    pub fn panel_intersection(&self, direction: &Vector3<f64>) -> Option<usize> {
        self.panels
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let (xy, t) = p.ray_intersection(direction)?;
                p.is_coord_valid(xy).then_some((i, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn refresh_panels(&mut self) {
        if let Layout::Hierarchy { root } = &self.layout {
            for panel in &mut self.panels {
                let local = *panel.local_frame();
                panel.set_frames(root.compose(&local), local);
            }
            debug!(panels = self.panels.len(), "recomputed panel frames from hierarchy root");
        }
    }
}

impl<'a> IntoIterator for &'a Detector {
    type Item = &'a Panel;
    type IntoIter = std::slice::Iter<'a, Panel>;

    fn into_iter(self) -> Self::IntoIter {
        self.panels.iter()
    }
}
