//! The interactive canvas: one store, one camera, one gesture at a time

use crate::drag::{self, Gesture, MoveOutcome, ReleaseOutcome};
use crate::events::{ExportKind, OutboundEvent};
use crate::frame::FrameState;
use crate::history::History;
use crate::reassemble;
use crate::search::Search;
use depviz_core::{
    Artifacts, Direction, EdgeKey, EdgeKind, GraphStore, ImpactSummary, LayoutConfig, MergeReport,
    Node, NodeId, NodeKind, Point, Slice, Snapshot, TypeVisibility, ViewState, impact_slice,
    summarize,
};
use depviz_infer::apply_inferred_edges;
use depviz_layout::{
    ArrangeMode, Focus, Layout, LayoutEngine, RoutedEdge, Scene, SceneOptions, arrange, node_at,
    route_all, spawn_position,
};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};

/// A computed slice and the direction it was computed in.
#[derive(Debug, Clone)]
pub struct ActiveSlice {
    pub seed: NodeId,
    pub direction: Direction,
    pub slice: Slice,
}

/// Serializable export body plus the name the host should suggest.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub kind: ExportKind,
    pub suggested_name: String,
    pub content: String,
}

pub struct Session {
    store: GraphStore,
    view: ViewState,
    engine: LayoutEngine,
    layout: Layout,
    routes: HashMap<EdgeKey, RoutedEdge>,
    scene: Scene,
    gesture: Gesture,
    frame: FrameState,
    events: VecDeque<OutboundEvent>,
    slice: Option<ActiveSlice>,
    focus: Option<Focus>,
    search: Search,
    history: History,
    spawn_seq: usize,
    spawn_origin: Point,
    viewport: (f64, f64),
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl Session {
    pub fn new(config: LayoutConfig) -> Self {
        let history = History::new(config.history_depth);
        let mut session = Session {
            store: GraphStore::new(),
            view: ViewState::default(),
            engine: LayoutEngine::new(config),
            layout: Layout::default(),
            routes: HashMap::new(),
            scene: Scene::default(),
            gesture: Gesture::Idle,
            frame: FrameState::default(),
            events: VecDeque::new(),
            slice: None,
            focus: None,
            search: Search::default(),
            history,
            spawn_seq: 0,
            spawn_origin: Point::new(40.0, 40.0),
            viewport: (1280.0, 800.0),
        };
        session.relayout();
        session
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn routes(&self) -> &HashMap<EdgeKey, RoutedEdge> {
        &self.routes
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn active_slice(&self) -> Option<&ActiveSlice> {
        self.slice.as_ref()
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn search_state(&self) -> &Search {
        &self.search
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn needs_redraw(&self) -> bool {
        self.frame.needs_redraw()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frame.frames()
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    pub fn set_spawn_origin(&mut self, origin: Point) {
        self.spawn_origin = origin;
    }

    pub fn drain_events(&mut self) -> Vec<OutboundEvent> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: OutboundEvent) {
        self.events.push_back(event);
    }

    // ── Frame ───────────────────────────────────────────

    /// Recompute boxes, edge routes and the draw list right now.
    pub fn relayout(&mut self) {
        self.layout = self.engine.layout(&mut self.store);
        self.routes = route_all(&self.store, &self.layout, self.engine.config());
        let options = SceneOptions {
            visibility: self.view.type_visibility,
            slice: self.slice.as_ref().map(|s| &s.slice),
            focus: self.focus.as_ref(),
            searching: self.search.is_active(),
        };
        self.scene = Scene::build(&self.store, &self.layout, &self.routes, &options);
    }

    /// Run one animation frame: apply the coalesced pointer move, then
    /// redraw if anything changed. Returns whether a redraw happened.
    pub fn frame(&mut self) -> bool {
        if let Some(pointer) = self.frame.take_pointer() {
            self.apply_move(pointer);
        }
        if !self.frame.begin() {
            return false;
        }
        self.relayout();
        true
    }

    fn apply_move(&mut self, pointer: Point) {
        let Gesture::Dragging(drag) = &mut self.gesture else {
            return;
        };
        let config = self.engine.config().clone();
        match drag::drag_to(&mut self.store, &self.layout, &config, drag, pointer) {
            MoveOutcome::Ignored => {}
            MoveOutcome::Moved | MoveOutcome::Detached => self.frame.mark_dirty(),
        }
    }

    // ── Graph payloads ──────────────────────────────────

    /// Merge an import payload. New modules without a position are fanned
    /// out from the spawn origin; calls are inferred afterwards.
    pub fn merge(&mut self, mut artifacts: Artifacts) -> MergeReport {
        let config = self.engine.config();
        for record in artifacts.nodes.iter_mut() {
            if record.kind != NodeKind::Module || record.has_position() || self.store.contains(&record.id) {
                continue;
            }
            let pos = spawn_position(self.spawn_origin, self.spawn_seq, config.spawn_spacing_x, config.spawn_spacing_y);
            self.spawn_seq += 1;
            record.x = Some(pos.x);
            record.y = Some(pos.y);
        }
        let report = self.store.merge(artifacts);
        let repaired = self.store.normalize();
        if repaired > 0 {
            debug!("normalized {} nodes after merge", repaired);
        }
        let inferred = apply_inferred_edges(&mut self.store);
        info!(
            "merged {} new / {} updated nodes, {} edges (+{} inferred)",
            report.added_nodes, report.updated_nodes, report.added_edges, inferred
        );
        self.after_graph_change("Import");
        report
    }

    /// Clear, then merge.
    pub fn replace(&mut self, artifacts: Artifacts) -> MergeReport {
        self.reset_overlays();
        self.store.clear();
        self.spawn_seq = 0;
        self.merge(artifacts)
    }

    /// Replace camera, filters and graph wholesale.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        self.apply_snapshot(&snapshot);
        self.after_graph_change("Load");
    }

    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let config = self.engine.config();
        self.view = snapshot.view;
        self.view.zoom = self.view.zoom.clamp(config.zoom_min, config.zoom_max);
        self.reset_overlays();
        self.store.replace(snapshot.data.clone());
        self.store.normalize();
        self.frame.mark_dirty();
        self.relayout();
    }

    pub fn clear(&mut self) {
        self.reset_overlays();
        self.store.clear();
        self.spawn_seq = 0;
        self.after_graph_change("Clear");
    }

    fn reset_overlays(&mut self) {
        if let Gesture::Dragging(drag) = std::mem::take(&mut self.gesture) {
            drag::cancel(&mut self.store, &drag);
        }
        self.frame.discard_pointer();
        self.slice = None;
        self.focus = None;
        self.search.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.view, self.store.to_artifacts())
    }

    /// Relayout and record a history entry; a new state is also sent to
    /// the host for persistence.
    fn after_graph_change(&mut self, label: &str) {
        self.frame.mark_dirty();
        self.relayout();
        let snapshot = self.snapshot();
        if let Some(hash) = self.history.push(snapshot.clone()) {
            self.emit(OutboundEvent::PersistSnapshot {
                label: label.to_string(),
                hash,
                payload: snapshot,
            });
        }
    }

    // ── Modules ─────────────────────────────────────────

    pub fn set_all_collapsed(&mut self, collapsed: bool) {
        self.store.set_all_collapsed(collapsed);
        self.after_graph_change(if collapsed { "Collapse all" } else { "Expand all" });
    }

    pub fn toggle_collapse(&mut self, id: &NodeId) -> Option<bool> {
        let collapsed = self.store.toggle_collapsed(id)?;
        self.after_graph_change("Toggle collapse");
        Some(collapsed)
    }

    pub fn arrange(&mut self, mode: ArrangeMode) -> usize {
        let placed = arrange(&mut self.store, &self.engine, mode);
        self.after_graph_change("Arrange");
        placed
    }

    // ── Pointer ─────────────────────────────────────────

    /// Press at a screen point. Grabs the topmost node there, if any.
    pub fn pointer_down(&mut self, screen: Point) -> Option<NodeId> {
        let world = self.view.to_world(screen);
        let id = node_at(&self.store, &self.layout, world)?.id.clone();
        self.pointer_down_on(&id, screen).then_some(id)
    }

    /// Press on a known node (the host did its own hit-testing).
    pub fn pointer_down_on(&mut self, id: &NodeId, screen: Point) -> bool {
        if let Gesture::Dragging(previous) = std::mem::take(&mut self.gesture) {
            warn!("pointer down while dragging {}; cancelling", previous.node);
            drag::cancel(&mut self.store, &previous);
        }
        let world = self.view.to_world(screen);
        match drag::begin(&self.store, &self.layout, id, world) {
            Some(d) => {
                self.gesture = Gesture::Dragging(d);
                true
            }
            None => false,
        }
    }

    /// Queue a move; only the latest move before the next frame runs.
    pub fn pointer_move(&mut self, screen: Point) -> bool {
        if !self.gesture.is_dragging() {
            return false;
        }
        let world = self.view.to_world(screen);
        if self.frame.queue_pointer(world) {
            debug!("coalesced pointer move");
        }
        true
    }

    /// Release: flush the last move, then dock or settle.
    pub fn pointer_up(&mut self, screen: Point) -> Option<ReleaseOutcome> {
        let Gesture::Dragging(_) = self.gesture else {
            return None;
        };
        self.frame.discard_pointer();
        self.apply_move(self.view.to_world(screen));
        self.relayout();

        let Gesture::Dragging(drag) = std::mem::take(&mut self.gesture) else {
            return None;
        };
        let config = self.engine.config().clone();
        let outcome = drag::release(&mut self.store, &self.layout, &config, &drag);
        if let ReleaseOutcome::Refused { .. } = &outcome {
            self.emit(OutboundEvent::Flash { id: drag.node.clone() });
        }
        self.after_graph_change("Move");
        Some(outcome)
    }

    /// Abandon the gesture and restore the node's original placement.
    pub fn pointer_cancel(&mut self) -> bool {
        self.frame.discard_pointer();
        let Gesture::Dragging(drag) = std::mem::take(&mut self.gesture) else {
            return false;
        };
        drag::cancel(&mut self.store, &drag);
        self.frame.mark_dirty();
        self.relayout();
        true
    }

    // ── Slice & focus ───────────────────────────────────

    /// Compute and show the impact slice from `seed`, and send its summary.
    pub fn slice(&mut self, seed: &NodeId, direction: Direction) -> Option<ImpactSummary> {
        if !self.store.contains(seed) {
            return None;
        }
        let slice = impact_slice(
            &self.store,
            seed,
            direction,
            self.view.type_visibility,
            self.engine.config().slice_budget(),
        );
        if slice.partial {
            warn!("impact slice from {} hit its time budget; showing partial result", seed);
        }
        let summary = summarize(&self.store, &slice, direction);
        self.emit(OutboundEvent::ImpactSummary(summary.clone()));
        self.slice = Some(ActiveSlice {
            seed: seed.clone(),
            direction,
            slice,
        });
        self.frame.mark_dirty();
        self.relayout();
        Some(summary)
    }

    pub fn clear_slice(&mut self) {
        if self.slice.take().is_some() {
            self.frame.mark_dirty();
            self.relayout();
        }
    }

    pub fn set_focus(&mut self, focus: Option<Focus>) {
        let focus = focus.filter(|f| match f {
            Focus::Node(id) | Focus::Module(id) => self.store.contains(id),
        });
        self.focus = focus;
        self.frame.mark_dirty();
        self.relayout();
    }

    pub fn focus_node(&mut self, id: &NodeId) {
        self.set_focus(Some(Focus::Node(id.clone())));
    }

    pub fn focus_module(&mut self, id: &NodeId) {
        self.set_focus(Some(Focus::Module(id.clone())));
    }

    pub fn set_type_visibility(&mut self, visibility: TypeVisibility) {
        self.view.type_visibility = visibility;
        self.frame.mark_dirty();
        self.relayout();
    }

    pub fn toggle_type(&mut self, kind: EdgeKind) {
        let mut v = self.view.type_visibility;
        v.toggle(kind);
        self.set_type_visibility(v);
    }

    // ── Editing ─────────────────────────────────────────

    /// Delete a node and everything docked under it.
    pub fn delete(&mut self, id: &NodeId) -> Vec<Node> {
        if let Some(dragged) = self.gesture.node()
            && (dragged == id || self.store.descendants(id).contains(dragged))
        {
            self.gesture = Gesture::Idle;
            self.frame.discard_pointer();
        }
        let removed = self.store.remove(id);
        if removed.is_empty() {
            return removed;
        }
        for node in removed.iter().filter(|n| n.kind() == NodeKind::Module) {
            if let Some(path) = &node.fs_path {
                self.events.push_back(OutboundEvent::EvictFingerprint { fs_path: path.clone() });
            }
        }
        if let Some(Focus::Node(f) | Focus::Module(f)) = &self.focus
            && !self.store.contains(f)
        {
            self.focus = None;
        }
        if let Some(active) = &mut self.slice {
            active.slice.nodes.retain(|n| self.store.contains(n));
        }
        self.search.retain_existing(&self.store);
        self.after_graph_change("Delete");
        removed
    }

    pub fn reattach(&mut self, id: &NodeId) -> bool {
        let changed = reassemble::reattach(&mut self.store, id);
        if changed {
            self.after_graph_change("Reattach");
        }
        changed
    }

    pub fn reassemble(&mut self, id: &NodeId) -> bool {
        let changed = reassemble::reassemble(&mut self.store, id);
        if changed {
            self.after_graph_change("Reassemble");
        }
        changed
    }

    pub fn has_lost_children(&self, id: &NodeId) -> bool {
        reassemble::has_lost_children(&self.store, id)
    }

    // ── Search ──────────────────────────────────────────

    pub fn search(&mut self, query: &str) -> usize {
        let hits = self.search.set_query(&self.store, query);
        self.frame.mark_dirty();
        self.relayout();
        hits
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.frame.mark_dirty();
        self.relayout();
    }

    /// Move to the next hit and centre the camera on it.
    pub fn search_next(&mut self) -> Option<NodeId> {
        let hit = self.search.next().cloned()?;
        self.center_on(&hit);
        Some(hit)
    }

    pub fn search_prev(&mut self) -> Option<NodeId> {
        let hit = self.search.prev().cloned()?;
        self.center_on(&hit);
        Some(hit)
    }

    // ── Camera ──────────────────────────────────────────

    pub fn center_on(&mut self, id: &NodeId) -> bool {
        let Some(p) = depviz_layout::anchor_point(&self.store, &self.layout, id) else {
            return false;
        };
        let (w, h) = self.viewport;
        self.view.center_on(p, w, h);
        self.frame.mark_dirty();
        true
    }

    /// Keyboard pan by whole steps (positive moves content right/down).
    pub fn pan_steps(&mut self, dx: i32, dy: i32) {
        let step = self.engine.config().pan_step;
        self.view.pan.x += dx as f64 * step;
        self.view.pan.y += dy as f64 * step;
        self.frame.mark_dirty();
    }

    /// Keyboard zoom by whole steps around the viewport centre.
    pub fn zoom_steps(&mut self, steps: i32) {
        let config = self.engine.config();
        let target = self.view.zoom + steps as f64 * config.zoom_step;
        let pivot = Point::new(self.viewport.0 / 2.0, self.viewport.1 / 2.0);
        let (min, max) = (config.zoom_min, config.zoom_max);
        self.view.zoom_to(target, pivot, min, max);
        self.frame.mark_dirty();
    }

    // ── History & persistence ───────────────────────────

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot, "Undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot, "Redo");
        true
    }

    fn restore(&mut self, snapshot: Snapshot, label: &str) {
        self.apply_snapshot(&snapshot);
        self.emit(OutboundEvent::PersistSnapshot {
            label: label.to_string(),
            hash: snapshot.content_hash(),
            payload: snapshot,
        });
    }

    /// Explicit save: always asks the host to persist.
    pub fn save(&mut self) {
        let snapshot = self.snapshot();
        self.emit(OutboundEvent::PersistSnapshot {
            label: "Save".to_string(),
            hash: snapshot.content_hash(),
            payload: snapshot,
        });
    }

    /// Build an export body and queue it for the host.
    pub fn export(&mut self, kind: ExportKind) -> depviz_core::Result<ExportPayload> {
        let content = match kind {
            ExportKind::Json => serde_json::to_string_pretty(&self.store.to_artifacts())?,
            ExportKind::Dv => self.snapshot().to_json_pretty()?,
            ExportKind::Svg | ExportKind::Png => self.scene.to_svg(self.layout.extent()),
        };
        let payload = ExportPayload {
            kind,
            suggested_name: kind.suggested_name().to_string(),
            content,
        };
        self.emit(OutboundEvent::Export {
            kind,
            suggested_name: payload.suggested_name.clone(),
            content: payload.content.clone(),
        });
        Ok(payload)
    }

    // ── Navigation ──────────────────────────────────────

    /// Ask the host to open the node's file at its recorded position.
    pub fn open_location(&mut self, id: &NodeId) -> bool {
        let Some(node) = self.store.node(id) else {
            return false;
        };
        let Some(file) = node.fs_path.clone() else {
            return false;
        };
        let (line, col) = node.range.map(|r| (r.line, r.col)).unwrap_or((0, 0));
        self.emit(OutboundEvent::OpenLocation { file, line, col });
        true
    }

    /// Ask the host to peek call sites of a function by name.
    pub fn peek(&mut self, id: &NodeId) -> bool {
        let Some(node) = self.store.node(id).filter(|n| n.kind() == NodeKind::Func) else {
            return false;
        };
        let Some(file) = node.fs_path.clone() else {
            return false;
        };
        let symbol_name = node.bare_name().to_string();
        self.emit(OutboundEvent::PeekSymbol { file, symbol_name });
        true
    }
}
