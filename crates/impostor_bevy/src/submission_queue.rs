//! Per-frame submission queue between the engine and the render world.
//!
//! Implements [`InstanceRenderer`] so `ImpostorEngine::submit` can write into
//! it. Instance data is copied only when a tier's buffer revision changes,
//! which at the reallocation cadence is a few times per second at most.
//!
//! # Usage
//!
//! ```ignore
//! queue.begin_frame();
//! engine.submit(&mut queue);
//!
//! for tier in queue.geometry() {
//!     upload_instances(&tier.mesh, &tier.data);
//! }
//! ```

use bevy::prelude::*;
use impostor_plugin::atlas::AtlasCell;
use impostor_plugin::{DetailTier, ImpostorBatch, InstanceRenderer, TransformBuffer};

/// Latest instance data for one full-geometry tier.
#[derive(Clone, Debug)]
pub struct GeometrySubmission {
	pub tier: DetailTier,
	pub mesh: Handle<Mesh>,
	/// Rows of each instance's 4×4 world transform.
	pub data: Vec<f32>,
	pub instance_count: usize,
	/// Buffer revision `data` was copied from.
	pub revision: u64,
	/// Submitted during the current frame.
	pub active: bool,
}

/// Latest impostor batch.
#[derive(Clone, Debug)]
pub struct ImpostorSubmission {
	pub atlas: Handle<Image>,
	pub cell: AtlasCell,
	/// Offset of `cell`; per-instance cells offset by `uv_size * (h, v)`.
	pub uv_offset: Vec2,
	pub uv_size: Vec2,
	pub num_angles: u32,
	pub elevation_steps: u32,
	pub elevation_step_degrees: f32,
	/// `(x, y, z, yaw)` per instance.
	pub data: Vec<f32>,
	/// Row-major cell index per instance; empty when `cell` applies to all.
	pub cells: Vec<u32>,
	pub instance_count: usize,
	pub revision: u64,
	pub active: bool,
}

/// Statistics from the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionStats {
	/// Tiers submitted this frame, impostor batch included.
	pub batches: usize,
	/// Instances submitted this frame.
	pub instances: usize,
	/// Buffers copied because their revision changed.
	pub uploads: usize,
}

/// Resource consumed by the host render plugin.
#[derive(Resource, Default)]
pub struct ImpostorSubmissions {
	geometry: Vec<GeometrySubmission>,
	impostor: Option<ImpostorSubmission>,
	stats: SubmissionStats,
}

impl ImpostorSubmissions {
	/// Mark every slot inactive; slots not resubmitted stay hidden.
	pub fn begin_frame(&mut self) {
		for slot in &mut self.geometry {
			slot.active = false;
		}
		if let Some(slot) = &mut self.impostor {
			slot.active = false;
		}
		self.stats = SubmissionStats::default();
	}

	/// Tiers submitted this frame.
	pub fn geometry(&self) -> impl Iterator<Item = &GeometrySubmission> {
		self.geometry.iter().filter(|s| s.active)
	}

	/// Impostor batch, if submitted this frame.
	pub fn impostor(&self) -> Option<&ImpostorSubmission> {
		self.impostor.as_ref().filter(|s| s.active)
	}

	pub fn stats(&self) -> SubmissionStats {
		self.stats
	}
}

impl InstanceRenderer for ImpostorSubmissions {
	type Mesh = Handle<Mesh>;
	type Texture = Handle<Image>;

	fn add_instanced_geometry(&mut self, tier: DetailTier, mesh: &Handle<Mesh>, buffer: &TransformBuffer) {
		self.stats.batches += 1;
		self.stats.instances += buffer.instance_count();

		let index = match self.geometry.iter().position(|s| s.tier == tier) {
			Some(index) => index,
			None => {
				self.geometry.push(GeometrySubmission {
					tier,
					mesh: mesh.clone(),
					data: Vec::new(),
					instance_count: 0,
					revision: u64::MAX,
					active: false,
				});
				self.geometry.len() - 1
			}
		};

		let slot = &mut self.geometry[index];
		slot.active = true;
		if slot.mesh != *mesh {
			slot.mesh = mesh.clone();
		}
		if slot.revision != buffer.revision() {
			slot.data.clear();
			slot.data.extend_from_slice(buffer.as_slice());
			slot.instance_count = buffer.instance_count();
			slot.revision = buffer.revision();
			self.stats.uploads += 1;
		}
	}

	fn add_impostor_batch(&mut self, batch: ImpostorBatch<'_, Handle<Image>>) {
		self.stats.batches += 1;
		self.stats.instances += batch.buffer.instance_count();

		let slot = self.impostor.get_or_insert_with(|| ImpostorSubmission {
			atlas: batch.atlas.texture().clone(),
			cell: batch.cell,
			uv_offset: Vec2::ZERO,
			uv_size: Vec2::ZERO,
			num_angles: 0,
			elevation_steps: 0,
			elevation_step_degrees: 0.0,
			data: Vec::new(),
			cells: Vec::new(),
			instance_count: 0,
			revision: u64::MAX,
			active: false,
		});

		slot.active = true;
		slot.atlas = batch.atlas.texture().clone();
		slot.cell = batch.cell;
		slot.uv_offset = batch.uv_offset();
		slot.uv_size = batch.uv_size();
		slot.num_angles = batch.num_angles();
		slot.elevation_steps = batch.elevation_steps();
		slot.elevation_step_degrees = batch.elevation_step_degrees();
		// Cells are recomputed together with the buffer.
		if slot.revision != batch.buffer.revision() {
			slot.data.clear();
			slot.data.extend_from_slice(batch.buffer.as_slice());
			slot.cells.clear();
			slot.cells.extend_from_slice(batch.cells.unwrap_or_default());
			slot.instance_count = batch.buffer.instance_count();
			slot.revision = batch.buffer.revision();
			self.stats.uploads += 1;
		}
	}
}
