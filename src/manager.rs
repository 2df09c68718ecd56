use std::collections::BTreeSet;

use slotmap::SlotMap;
use tracing::debug;

use crate::error::ManagerError;
use crate::math::{Point2, Vector2};
use crate::path::{ActivationChange, Path};
use crate::stage::RenderView;

slotmap::new_key_type! {
    /// Generational handle to a path owned by a [`PathManager`].
    ///
    /// A handle to a deleted path stays invalid even if its slot is reused.
    pub struct PathId;
}

/// Owns every path of a stage, in list order.
///
/// Tracks the path being edited (the *active* path, unrelated to timeline
/// activation) and the set of selected paths.
#[derive(Debug, Default)]
pub struct PathManager {
    paths: SlotMap<PathId, Path>,
    order: Vec<PathId>,
    active: Option<PathId>,
    selected: BTreeSet<PathId>,
}

impl PathManager {
    /// Creates a new, empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a manager owning `paths`, preserving their order.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = Path>) -> Self {
        let mut manager = Self::new();
        for path in paths {
            manager.insert(path);
        }
        manager
    }

    /// Clones the paths out in list order, for saving.
    #[must_use]
    pub fn to_paths(&self) -> Vec<Path> {
        self.iter().map(|(_, p)| p.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Paths with their handles, in list order.
    pub fn iter(&self) -> impl Iterator<Item = (PathId, &Path)> {
        self.order
            .iter()
            .filter_map(|&id| self.paths.get(id).map(|p| (id, p)))
    }

    /// Handles of paths currently inside their activation window, in list order.
    #[must_use]
    pub fn activated_ids(&self) -> Vec<PathId> {
        self.iter()
            .filter(|(_, p)| p.is_activated())
            .map(|(id, _)| id)
            .collect()
    }

    // --- Lookup ---

    /// Returns the path for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path was deleted.
    pub fn path(&self, id: PathId) -> Result<&Path, ManagerError> {
        self.paths.get(id).ok_or(ManagerError::PathNotFound)
    }

    /// Returns the path for `id` mutably.
    ///
    /// # Errors
    ///
    /// Returns an error if the path was deleted.
    pub fn path_mut(&mut self, id: PathId) -> Result<&mut Path, ManagerError> {
        self.paths.get_mut(id).ok_or(ManagerError::PathNotFound)
    }

    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<PathId> {
        self.order.get(index).copied()
    }

    /// List position of the path behind `id`. Identity lookup, not structural.
    #[must_use]
    pub fn find_path_index(&self, id: PathId) -> Option<usize> {
        self.order.iter().position(|&p| p == id)
    }

    fn checked_id(&self, index: usize) -> Result<PathId, ManagerError> {
        self.id_at(index).ok_or(ManagerError::IndexOutOfRange {
            what: "path",
            index,
            len: self.order.len(),
        })
    }

    // --- Editing ---

    /// Appends `path` and returns its handle. The editing selection is unchanged.
    pub fn insert(&mut self, path: Path) -> PathId {
        let id = self.paths.insert(path);
        self.order.push(id);
        id
    }

    /// Appends a new empty path, makes it the active (editing) path and returns its index.
    pub fn add_path(&mut self) -> usize {
        let name = format!("path-{}", self.order.len() + 1);
        let id = self.insert(Path::new(name));
        self.active = Some(id);
        debug!(index = self.order.len() - 1, "path added");
        self.order.len() - 1
    }

    #[must_use]
    pub fn active_path_id(&self) -> Option<PathId> {
        self.active
    }

    #[must_use]
    pub fn active_path_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.find_path_index(id))
    }

    pub fn active_path_mut(&mut self) -> Option<&mut Path> {
        self.active.and_then(|id| self.paths.get_mut(id))
    }

    /// Makes the path at `index` the active (editing) path.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn select_path(&mut self, index: usize) -> Result<(), ManagerError> {
        self.active = Some(self.checked_id(index)?);
        Ok(())
    }

    /// Clears the active (editing) path.
    pub fn deselect_path(&mut self) {
        self.active = None;
    }

    /// Adds or removes the path at `index` from the multi-selection.
    /// Returns whether it is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn toggle_selection(&mut self, index: usize) -> Result<bool, ManagerError> {
        let id = self.checked_id(index)?;
        if self.selected.remove(&id) {
            Ok(false)
        } else {
            self.selected.insert(id);
            Ok(true)
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected paths as list indices, ascending.
    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        self.order
            .iter()
            .enumerate()
            .filter(|(_, id)| self.selected.contains(id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Moves every selected path by `offset`.
    pub fn translate_selected(&mut self, offset: &Vector2) {
        for &id in &self.selected {
            if let Some(path) = self.paths.get_mut(id) {
                path.translate(offset);
            }
        }
    }

    /// Index of the path nearest to `point` within `tolerance`, for tap selection.
    #[must_use]
    pub fn path_at(&self, point: &Point2, tolerance: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, (_, path)) in self.iter().enumerate() {
            let d = path.distance_to_closest_point(point);
            if d > tolerance {
                continue;
            }
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Removes the active path, fading out its segments first.
    pub fn delete_active_path(&mut self, view: &mut impl RenderView) -> Option<Path> {
        let id = self.active.take()?;
        self.delete_path(id, view).ok()
    }

    /// Removes a path, fading out its segments first.
    ///
    /// # Errors
    ///
    /// Returns an error if the path was already deleted.
    pub fn delete_path(
        &mut self,
        id: PathId,
        view: &mut impl RenderView,
    ) -> Result<Path, ManagerError> {
        let path = self.paths.remove(id).ok_or(ManagerError::PathNotFound)?;
        for segment in path.segments() {
            view.fade_segment(segment, false);
        }
        self.order.retain(|&p| p != id);
        self.selected.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
        debug!(path = %path.name, "path deleted");
        Ok(path)
    }

    // --- Timeline ---

    /// Applies the activation rule to every path for `progress`.
    ///
    /// Segments of newly activated paths are faded in, those of deactivated
    /// paths faded out.
    pub fn update_activation(
        &mut self,
        progress: f64,
        view: &mut impl RenderView,
    ) -> Vec<(PathId, ActivationChange)> {
        let mut changes = Vec::new();
        for &id in &self.order {
            let Some(path) = self.paths.get_mut(id) else {
                continue;
            };
            let Some(change) = path.update_activation(progress) else {
                continue;
            };
            let show = change == ActivationChange::Activated;
            for segment in path.segments() {
                view.fade_segment(segment, show);
            }
            changes.push((id, change));
        }
        changes
    }

    /// Rebuilds every path's activation cache for `progress` without arming
    /// nodes. See [`Path::restore_activation`].
    pub fn restore_activation(&mut self, progress: f64) {
        for path in self.paths.values_mut() {
            path.restore_activation(progress);
        }
    }

    /// Explicit stage reset of every path and node.
    pub fn reset(&mut self) {
        for path in self.paths.values_mut() {
            path.reset();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::path::PathSegment;
    use crate::stage::NullView;
    use crate::trigger::TriggerNode;

    #[derive(Default)]
    struct FadeLog(Vec<bool>);

    impl RenderView for FadeLog {
        fn fade_segment(&mut self, _segment: &PathSegment, show: bool) {
            self.0.push(show);
        }
    }

    fn segment(x: f64) -> PathSegment {
        PathSegment::line(Point2::new(x, 0.0), Point2::new(x, 100.0))
    }

    fn manager_with(xs: &[f64]) -> PathManager {
        PathManager::from_paths(xs.iter().map(|&x| {
            let mut p = Path::new(format!("x{x}")).with_window(x, x + 100.0);
            p.push_segment(segment(x));
            p
        }))
    }

    #[test]
    fn add_path_becomes_active() {
        let mut m = PathManager::new();
        assert_eq!(m.add_path(), 0);
        assert_eq!(m.add_path(), 1);
        assert_eq!(m.active_path_index(), Some(1));
        assert!(m.active_path_mut().unwrap().is_empty());
    }

    #[test]
    fn delete_active_path_fades_and_clears() {
        let mut m = manager_with(&[0.0, 50.0]);
        m.select_path(0).unwrap();
        let mut view = FadeLog::default();

        let removed = m.delete_active_path(&mut view).unwrap();

        assert_eq!(removed.name, "x0");
        assert_eq!(view.0, vec![false]);
        assert_eq!(m.len(), 1);
        assert_eq!(m.active_path_index(), None);
        assert!(m.delete_active_path(&mut view).is_none());
    }

    #[test]
    fn stale_id_is_not_found_after_delete() {
        let mut m = manager_with(&[0.0]);
        let id = m.id_at(0).unwrap();
        m.delete_path(id, &mut NullView).unwrap();
        m.add_path();

        assert!(matches!(m.path(id), Err(ManagerError::PathNotFound)));
        assert_eq!(m.find_path_index(id), None);
    }

    #[test]
    fn find_path_index_is_by_identity() {
        let mut m = PathManager::new();
        let a = m.insert(Path::new("same"));
        let b = m.insert(Path::new("same"));
        assert_eq!(m.find_path_index(a), Some(0));
        assert_eq!(m.find_path_index(b), Some(1));
    }

    #[test]
    fn select_out_of_range_fails() {
        let mut m = manager_with(&[0.0]);
        assert!(matches!(
            m.select_path(3),
            Err(ManagerError::IndexOutOfRange { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn selection_toggles_and_survives_deletion_of_others() {
        let mut m = manager_with(&[0.0, 10.0, 20.0]);
        assert!(m.toggle_selection(0).unwrap());
        assert!(m.toggle_selection(2).unwrap());
        assert!(!m.toggle_selection(0).unwrap());
        assert_eq!(m.selected_indices(), vec![2]);

        let first = m.id_at(0).unwrap();
        m.delete_path(first, &mut NullView).unwrap();
        assert_eq!(m.selected_indices(), vec![1]);
    }

    #[test]
    fn translate_selected_moves_only_selection() {
        let mut m = manager_with(&[0.0, 10.0]);
        m.toggle_selection(1).unwrap();
        m.translate_selected(&Vector2::new(5.0, 0.0));
        let starts: Vec<f64> = m.iter().map(|(_, p)| p.segments()[0].start_point().x).collect();
        assert_eq!(starts, vec![0.0, 15.0]);
    }

    #[test]
    fn path_at_picks_nearest_within_tolerance() {
        let m = manager_with(&[0.0, 10.0]);
        assert_eq!(m.path_at(&Point2::new(7.0, 50.0), 5.0), Some(1));
        assert_eq!(m.path_at(&Point2::new(2.0, 50.0), 5.0), Some(0));
        assert_eq!(m.path_at(&Point2::new(50.0, 50.0), 5.0), None);
    }

    #[test]
    fn update_activation_drives_every_path() {
        let mut m = manager_with(&[0.0, 150.0]);
        let mut view = FadeLog::default();

        let changes = m.update_activation(50.0, &mut view);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1, ActivationChange::Activated);

        let changes = m.update_activation(160.0, &mut view);
        let kinds: Vec<_> = changes.iter().map(|(_, c)| *c).collect();
        assert_eq!(kinds, vec![ActivationChange::Deactivated, ActivationChange::Activated]);
        assert_eq!(view.0, vec![true, false, true]);
        assert_eq!(m.activated_ids(), vec![m.id_at(1).unwrap()]);
    }

    #[test]
    fn reset_clears_activation_and_nodes() {
        let mut m = manager_with(&[0.0]);
        m.path_mut(m.id_at(0).unwrap())
            .unwrap()
            .attach_node(TriggerNode::action(Point2::new(0.0, 10.0), None));
        m.update_activation(10.0, &mut NullView);

        m.reset();

        let path = m.path(m.id_at(0).unwrap()).unwrap();
        assert!(!path.is_activated());
        assert!(path.nodes().all(|n| !n.is_active()));
    }
}
