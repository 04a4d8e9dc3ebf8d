//! Marker operations. Each successful edit rebuilds the whole partition.

use splitforge_core::MarkerId;

use crate::timeline::{Rejection, Timeline, Transition};
use crate::tolerance::{within, MARKER_EPSILON};
use crate::types::SplitMarker;

impl Timeline {
    /// Add a split marker at `time`.
    ///
    /// Rejected when `time` is not strictly inside the timeline or lies
    /// within [`MARKER_EPSILON`] of an existing marker.
    pub fn add_marker(&self, time: f64) -> Transition {
        self.require_loaded()?;
        self.check_marker_time(time, None)?;

        let mut markers = self.markers().to_vec();
        markers.push(SplitMarker::new(time));
        tracing::debug!(time, markers = markers.len(), "marker added");
        Ok(self.rebuilt(markers))
    }

    /// Move marker `id` to `new_time`.
    ///
    /// Rejected when `new_time` is not strictly inside the timeline, when the
    /// marker is unknown, or when `new_time` lands within
    /// [`MARKER_EPSILON`] of another marker.
    pub fn update_marker(&self, id: MarkerId, new_time: f64) -> Transition {
        self.require_loaded()?;
        if self.marker(id).is_none() {
            return Err(Rejection::MarkerNotFound(id));
        }
        self.check_marker_time(new_time, Some(id))?;

        let markers = self
            .markers()
            .iter()
            .map(|m| {
                if m.id == id {
                    SplitMarker { id, time: new_time }
                } else {
                    *m
                }
            })
            .collect();
        tracing::debug!(%id, new_time, "marker moved");
        Ok(self.rebuilt(markers))
    }

    /// Remove marker `id`, merging the two segments it separated.
    pub fn delete_marker(&self, id: MarkerId) -> Transition {
        if self.marker(id).is_none() {
            return Err(Rejection::MarkerNotFound(id));
        }

        let markers = self
            .markers()
            .iter()
            .filter(|m| m.id != id)
            .copied()
            .collect();
        tracing::debug!(%id, "marker deleted");
        Ok(self.rebuilt(markers))
    }

    fn check_marker_time(&self, time: f64, ignore: Option<MarkerId>) -> Result<(), Rejection> {
        if !(time > 0.0 && time < self.duration()) {
            return Err(Rejection::OutOfRange { time });
        }
        if let Some(existing) = self
            .markers()
            .iter()
            .filter(|m| Some(m.id) != ignore)
            .find(|m| within(m.time, time, MARKER_EPSILON))
        {
            return Err(Rejection::TooCloseToMarker {
                time,
                existing: existing.time,
            });
        }
        Ok(())
    }
}
