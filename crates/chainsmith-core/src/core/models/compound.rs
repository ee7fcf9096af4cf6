use super::error::ModelError;
use super::ids::{NodeId, ParticleId, PortId};
use super::particle::Particle;
use super::port::{Anchor, Port, PortSpec};
use super::topology::Bond;
use crate::core::utils::geometry::{self, Axis};
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

/// Suffix marking a counter label: `$` is replaced by the number of siblings already
/// registered under the same base name.
const COUNTER_SUFFIX: &str = "[$]";
const DEFAULT_PORT_LABEL: &str = "port";

/// A typed reference to a child slot of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildRef {
    Particle(ParticleId),
    Port(PortId),
    Node(NodeId),
}

/// A child together with the label it was registered under.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledChild {
    pub label: String,
    pub child: ChildRef,
}

/// A value that can be inserted as a child of a node.
#[derive(Debug, Clone)]
pub enum Child {
    Particle(Particle),
    Port(PortSpec),
    Compound(Compound),
}

impl From<Particle> for Child {
    fn from(particle: Particle) -> Self {
        Child::Particle(particle)
    }
}

impl From<PortSpec> for Child {
    fn from(spec: PortSpec) -> Self {
        Child::Port(spec)
    }
}

impl From<Compound> for Child {
    fn from(compound: Compound) -> Self {
        Child::Compound(compound)
    }
}

/// One level of the hierarchy: a named scope of labeled children.
///
/// Children keep their insertion order. Counter labels (`name[$]`) are additionally
/// registered in a group under their base name, so `group("monomer")` yields the
/// `monomer[0]`, `monomer[1]`, ... children in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    origin: Point3<f64>,
    parent: Option<NodeId>,
    children: Vec<LabeledChild>,
    labels: HashMap<String, ChildRef>,
    groups: HashMap<String, Vec<ChildRef>>,
}

impl Node {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: Point3::origin(),
            parent: None,
            children: Vec::new(),
            labels: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The local origin used by fixed-axis rotations of this node.
    ///
    /// It starts at the global origin and moves with every transform applied to the node
    /// or one of its ancestors.
    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[LabeledChild] {
        &self.children
    }

    pub fn child(&self, label: &str) -> Option<ChildRef> {
        self.labels.get(label).copied()
    }

    /// Returns the children registered through counter labels with the given base name.
    pub fn group(&self, base: &str) -> &[ChildRef] {
        self.groups.get(base).map_or(&[], Vec::as_slice)
    }

    fn resolve_label(&self, requested: &str) -> Result<(String, Option<String>), ModelError> {
        let (label, group) = match requested.strip_suffix(COUNTER_SUFFIX) {
            Some(base) => {
                let count = self.group(base).len();
                (format!("{}[{}]", base, count), Some(base.to_string()))
            }
            None => (requested.to_string(), None),
        };
        if self.labels.contains_key(&label) {
            return Err(ModelError::LabelCollision { label });
        }
        Ok((label, group))
    }

    fn insert_child(&mut self, label: String, group: Option<String>, child: ChildRef) {
        if let Some(base) = group {
            self.groups.entry(base).or_default().push(child);
        }
        self.labels.insert(label.clone(), child);
        self.children.push(LabeledChild { label, child });
    }
}

/// A hierarchical container of particles, ports and nested compounds.
///
/// All entities live in arenas owned by the compound and are addressed by typed IDs.
/// Positions are absolute and every transform is applied eagerly to the whole affected
/// subtree, so no descendant is ever left in a stale frame.
///
/// Cloning copies the arenas wholesale: the clone is fully independent of the original and
/// every ID obtained from the original addresses the corresponding entity of the clone.
/// Inserting a compound into another one re-keys its contents; after that, labels are the
/// stable handles (see [`Compound::port_by_label`]).
#[derive(Debug, Clone)]
pub struct Compound {
    /// Primary storage for particles.
    particles: SlotMap<ParticleId, Particle>,
    /// Primary storage for ports.
    ports: SlotMap<PortId, Port>,
    /// Primary storage for hierarchy nodes; `root` is the compound itself.
    nodes: SlotMap<NodeId, Node>,
    /// Relation table from each port to the entity it is anchored on.
    port_anchors: SecondaryMap<PortId, Anchor>,
    /// List of all bonds in the compound.
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by particle ID.
    bond_adjacency: SecondaryMap<ParticleId, Vec<ParticleId>>,
    root: NodeId,
}

impl Default for Compound {
    fn default() -> Self {
        Self::new("Compound")
    }
}

impl Compound {
    /// Creates an empty compound whose root node carries `name`.
    pub fn new(name: &str) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(name));
        Self {
            particles: SlotMap::with_key(),
            ports: SlotMap::with_key(),
            nodes,
            port_anchors: SecondaryMap::new(),
            bonds: Vec::new(),
            bond_adjacency: SecondaryMap::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self) -> &str {
        &self.nodes[self.root].name
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id)
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.get_mut(id)
    }

    /// Returns the anchor a port was constructed on.
    pub fn anchor(&self, port: PortId) -> Option<Anchor> {
        self.port_anchors.get(port).copied()
    }

    /// Returns the current position of a port's anchor.
    ///
    /// A node anchor resolves to the centroid of the node's particles, or to its origin
    /// when it holds none.
    pub fn anchor_position(&self, port: PortId) -> Option<Point3<f64>> {
        self.anchor(port).and_then(|anchor| self.resolve_anchor(anchor))
    }

    fn resolve_anchor(&self, anchor: Anchor) -> Option<Point3<f64>> {
        match anchor {
            Anchor::Particle(id) => self.particles.get(id).map(|p| p.position),
            Anchor::Node(id) => {
                let node = self.nodes.get(id)?;
                Some(self.subtree_centroid(id).unwrap_or(node.origin))
            }
        }
    }

    // --- Construction ---

    /// Adds a particle under `parent`.
    ///
    /// # Arguments
    ///
    /// * `parent` - The node that will own the particle.
    /// * `label` - The label within the parent's scope; defaults to `<particle name>[$]`.
    /// * `particle` - The particle to insert.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeNotFound`] for an unknown parent and
    /// [`ModelError::LabelCollision`] if the label is taken.
    pub fn add_particle(
        &mut self,
        parent: NodeId,
        label: Option<&str>,
        mut particle: Particle,
    ) -> Result<ParticleId, ModelError> {
        let requested = label
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", particle.name, COUNTER_SUFFIX));
        let (label, group) = self.node_or_err(parent)?.resolve_label(&requested)?;

        particle.parent = Some(parent);
        let id = self.particles.insert(particle);
        self.bond_adjacency.insert(id, Vec::new());
        self.nodes[parent].insert_child(label, group, ChildRef::Particle(id));
        Ok(id)
    }

    /// Adds a port under `parent`, placed at its anchor's position plus `spec.offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeNotFound`] / [`ModelError::ParticleNotFound`] for unknown
    /// parent or anchor, [`ModelError::DegenerateOrientation`] for a zero orientation, and
    /// [`ModelError::LabelCollision`] if the label is taken.
    pub fn add_port(
        &mut self,
        parent: NodeId,
        label: Option<&str>,
        spec: PortSpec,
    ) -> Result<PortId, ModelError> {
        let requested = label
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", DEFAULT_PORT_LABEL, COUNTER_SUFFIX));
        let (label, group) = self.node_or_err(parent)?.resolve_label(&requested)?;

        let anchor_position = self.resolve_anchor(spec.anchor).ok_or(match spec.anchor {
            Anchor::Particle(id) => ModelError::ParticleNotFound(id),
            Anchor::Node(id) => ModelError::NodeNotFound(id),
        })?;
        let mut port = Port::new(anchor_position + spec.offset, spec.orientation)?;

        port.parent = Some(parent);
        let id = self.ports.insert(port);
        self.port_anchors.insert(id, spec.anchor);
        self.nodes[parent].insert_child(label, group, ChildRef::Port(id));
        Ok(id)
    }

    /// Moves `other` into this compound as a child node of `parent`.
    ///
    /// The contents of `other` are re-keyed; its internal labels, groups, anchors and bonds
    /// are preserved. The returned ID addresses the former root of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeNotFound`] for an unknown parent and
    /// [`ModelError::LabelCollision`] if the label is taken. `self` is unchanged on error.
    pub fn add_compound(
        &mut self,
        parent: NodeId,
        label: Option<&str>,
        other: Compound,
    ) -> Result<NodeId, ModelError> {
        let requested = label
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", other.name(), COUNTER_SUFFIX));
        let (label, group) = self.node_or_err(parent)?.resolve_label(&requested)?;

        let node_id = self.absorb(other);
        self.nodes[node_id].parent = Some(parent);
        self.nodes[parent].insert_child(label, group, ChildRef::Node(node_id));
        Ok(node_id)
    }

    /// Inserts any kind of child under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: Option<&str>,
        child: impl Into<Child>,
    ) -> Result<ChildRef, ModelError> {
        match child.into() {
            Child::Particle(particle) => self
                .add_particle(parent, label, particle)
                .map(ChildRef::Particle),
            Child::Port(spec) => self.add_port(parent, label, spec).map(ChildRef::Port),
            Child::Compound(compound) => self
                .add_compound(parent, label, compound)
                .map(ChildRef::Node),
        }
    }

    /// Records a bond between two particles. Adding an existing bond is a no-op.
    pub fn add_bond(&mut self, a: ParticleId, b: ParticleId) -> Result<(), ModelError> {
        if !self.particles.contains_key(a) {
            return Err(ModelError::ParticleNotFound(a));
        }
        if !self.particles.contains_key(b) {
            return Err(ModelError::ParticleNotFound(b));
        }
        if self.bond_adjacency[a].contains(&b) {
            return Ok(());
        }
        self.bonds.push(Bond::new(a, b));
        self.bond_adjacency[a].push(b);
        self.bond_adjacency[b].push(a);
        Ok(())
    }

    fn absorb(&mut self, other: Compound) -> NodeId {
        let Compound {
            particles,
            ports,
            nodes,
            port_anchors,
            bonds,
            root,
            ..
        } = other;

        // 1. Reserve new keys for every node so parents can be remapped in any order.
        let mut node_map: SecondaryMap<NodeId, NodeId> = SecondaryMap::new();
        for old_id in nodes.keys() {
            node_map.insert(old_id, self.nodes.insert(Node::new("")));
        }

        // 2. Move particles and ports.
        let mut particle_map: SecondaryMap<ParticleId, ParticleId> = SecondaryMap::new();
        for (old_id, mut particle) in particles {
            particle.parent = particle.parent.map(|p| node_map[p]);
            let new_id = self.particles.insert(particle);
            self.bond_adjacency.insert(new_id, Vec::new());
            particle_map.insert(old_id, new_id);
        }
        let mut port_map: SecondaryMap<PortId, PortId> = SecondaryMap::new();
        for (old_id, mut port) in ports {
            port.parent = port.parent.map(|p| node_map[p]);
            port_map.insert(old_id, self.ports.insert(port));
        }
        for (old_id, anchor) in port_anchors {
            let anchor = match anchor {
                Anchor::Particle(id) => Anchor::Particle(particle_map[id]),
                Anchor::Node(id) => Anchor::Node(node_map[id]),
            };
            self.port_anchors.insert(port_map[old_id], anchor);
        }

        // 3. Rebuild every node with remapped children.
        let remap = |child: ChildRef| match child {
            ChildRef::Particle(id) => ChildRef::Particle(particle_map[id]),
            ChildRef::Port(id) => ChildRef::Port(port_map[id]),
            ChildRef::Node(id) => ChildRef::Node(node_map[id]),
        };
        for (old_id, node) in nodes {
            let rebuilt = Node {
                name: node.name,
                origin: node.origin,
                parent: node.parent.map(|p| node_map[p]),
                children: node
                    .children
                    .into_iter()
                    .map(|c| LabeledChild {
                        label: c.label,
                        child: remap(c.child),
                    })
                    .collect(),
                labels: node
                    .labels
                    .into_iter()
                    .map(|(label, child)| (label, remap(child)))
                    .collect(),
                groups: node
                    .groups
                    .into_iter()
                    .map(|(base, members)| (base, members.into_iter().map(remap).collect()))
                    .collect(),
            };
            self.nodes[node_map[old_id]] = rebuilt;
        }

        // 4. Carry bonds over.
        for bond in bonds {
            let a = particle_map[bond.particle1_id];
            let b = particle_map[bond.particle2_id];
            self.bonds.push(Bond::new(a, b));
            self.bond_adjacency[a].push(b);
            self.bond_adjacency[b].push(a);
        }

        node_map[root]
    }

    // --- Lookup ---

    pub fn child_by_label(&self, node: NodeId, label: &str) -> Option<ChildRef> {
        self.nodes.get(node)?.child(label)
    }

    pub fn port_by_label(&self, node: NodeId, label: &str) -> Option<PortId> {
        match self.child_by_label(node, label)? {
            ChildRef::Port(id) => Some(id),
            _ => None,
        }
    }

    pub fn particle_by_label(&self, node: NodeId, label: &str) -> Option<ParticleId> {
        match self.child_by_label(node, label)? {
            ChildRef::Particle(id) => Some(id),
            _ => None,
        }
    }

    pub fn node_by_label(&self, node: NodeId, label: &str) -> Option<NodeId> {
        match self.child_by_label(node, label)? {
            ChildRef::Node(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the children of `node` registered under the counter-label base `base`.
    pub fn group(&self, node: NodeId, base: &str) -> &[ChildRef] {
        self.nodes.get(node).map_or(&[], |n| n.group(base))
    }

    /// Returns `true` if `child` lies in the subtree rooted at `node` (inclusive).
    pub fn contains(&self, node: NodeId, child: ChildRef) -> bool {
        let mut current = match child {
            ChildRef::Particle(id) => self.particles.get(id).and_then(|p| p.parent),
            ChildRef::Port(id) => self.ports.get(id).and_then(|p| p.parent),
            ChildRef::Node(id) => self.nodes.get(id).map(|_| id),
        };
        while let Some(id) = current {
            if id == node {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Returns every descendant of `node` in depth-first insertion order.
    pub fn descendants(&self, node: NodeId) -> Vec<ChildRef> {
        let mut out = Vec::new();
        self.collect_descendants(node, &mut out);
        out
    }

    fn collect_descendants(&self, node: NodeId, out: &mut Vec<ChildRef>) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        for labeled in &n.children {
            out.push(labeled.child);
            if let ChildRef::Node(id) = labeled.child {
                self.collect_descendants(id, out);
            }
        }
    }

    // --- Read-only traversal ---

    /// Returns all particles in depth-first insertion order.
    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.descendants(self.root)
            .into_iter()
            .filter_map(move |child| match child {
                ChildRef::Particle(id) => self.particles.get(id).map(|p| (id, p)),
                _ => None,
            })
    }

    /// Returns all ports in depth-first insertion order, used or not.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> + '_ {
        self.descendants(self.root)
            .into_iter()
            .filter_map(move |child| match child {
                ChildRef::Port(id) => self.ports.get(id).map(|p| (id, p)),
                _ => None,
            })
    }

    /// Returns the ports that can still take part in an alignment.
    pub fn available_ports(&self) -> impl Iterator<Item = (PortId, &Port)> + '_ {
        self.ports().filter(|(_, port)| !port.is_used())
    }

    pub fn used_ports(&self) -> impl Iterator<Item = (PortId, &Port)> + '_ {
        self.ports().filter(|(_, port)| port.is_used())
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bonded_neighbors(&self, particle: ParticleId) -> Option<&[ParticleId]> {
        self.bond_adjacency.get(particle).map(Vec::as_slice)
    }

    /// Returns the absolute particle positions in traversal order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.particles().map(|(_, p)| p.position).collect()
    }

    /// Returns the centroid of all particles, or `None` for a compound without particles.
    pub fn center(&self) -> Option<Point3<f64>> {
        self.subtree_centroid(self.root)
    }

    /// Returns the centroid of the particles below `node`.
    pub fn center_of(&self, node: NodeId) -> Result<Option<Point3<f64>>, ModelError> {
        self.node_or_err(node)?;
        Ok(self.subtree_centroid(node))
    }

    fn subtree_centroid(&self, node: NodeId) -> Option<Point3<f64>> {
        let positions: Vec<Point3<f64>> = self
            .descendants(node)
            .into_iter()
            .filter_map(|child| match child {
                ChildRef::Particle(id) => self.particles.get(id).map(|p| p.position),
                _ => None,
            })
            .collect();
        geometry::centroid(&positions)
    }

    // --- Geometry kernel ---

    /// Translates the whole compound by `offset`.
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        self.apply_translation(self.root, offset);
    }

    /// Translates the subtree rooted at `node` by `offset`.
    pub fn translate_node(&mut self, node: NodeId, offset: &Vector3<f64>) -> Result<(), ModelError> {
        self.node_or_err(node)?;
        self.apply_translation(node, offset);
        Ok(())
    }

    /// Moves the compound so that its centroid lands on `target`.
    ///
    /// A compound without particles is moved by its origin instead.
    pub fn translate_to(&mut self, target: &Point3<f64>) {
        let reference = self.center().unwrap_or(self.nodes[self.root].origin);
        self.translate(&(target - reference));
    }

    /// Rotates the whole compound by `angle` radians about `axis` through its local origin.
    ///
    /// Successive calls compose on the current state: rotating about x then z differs from
    /// rotating about z then x.
    pub fn rotate(&mut self, axis: Axis, angle: f64) {
        let pivot = self.nodes[self.root].origin;
        self.apply_rotation(self.root, &axis.rotation(angle), &pivot);
    }

    /// Rotates the subtree rooted at `node` about `axis` through that node's local origin.
    pub fn rotate_node(&mut self, node: NodeId, axis: Axis, angle: f64) -> Result<(), ModelError> {
        let pivot = self.node_or_err(node)?.origin;
        self.apply_rotation(node, &axis.rotation(angle), &pivot);
        Ok(())
    }

    /// Rotates the subtree rooted at `node` about an arbitrary axis through `pivot`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NodeNotFound`] for an unknown node and
    /// [`ModelError::DegenerateOrientation`] for a zero axis.
    pub fn rotate_about(
        &mut self,
        node: NodeId,
        axis: &Vector3<f64>,
        angle: f64,
        pivot: &Point3<f64>,
    ) -> Result<(), ModelError> {
        self.node_or_err(node)?;
        let axis = unit_axis(axis)?;
        self.apply_rotation(node, &Rotation3::from_axis_angle(&axis, angle), pivot);
        Ok(())
    }

    /// Rotates the whole compound in place about an axis through its centroid.
    pub fn spin(&mut self, axis: &Vector3<f64>, angle: f64) -> Result<(), ModelError> {
        let pivot = self.center().unwrap_or(self.nodes[self.root].origin);
        self.rotate_about(self.root, axis, angle, &pivot)
    }

    pub(crate) fn apply_translation(&mut self, node: NodeId, offset: &Vector3<f64>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.origin += offset;
        }
        for child in self.descendants(node) {
            match child {
                ChildRef::Particle(id) => {
                    if let Some(particle) = self.particles.get_mut(id) {
                        particle.position += offset;
                    }
                }
                ChildRef::Port(id) => {
                    if let Some(port) = self.ports.get_mut(id) {
                        port.position += offset;
                    }
                }
                ChildRef::Node(id) => {
                    if let Some(n) = self.nodes.get_mut(id) {
                        n.origin += offset;
                    }
                }
            }
        }
    }

    pub(crate) fn apply_rotation(
        &mut self,
        node: NodeId,
        rotation: &Rotation3<f64>,
        pivot: &Point3<f64>,
    ) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.origin = geometry::rotate_about(&n.origin, rotation, pivot);
        }
        for child in self.descendants(node) {
            match child {
                ChildRef::Particle(id) => {
                    if let Some(particle) = self.particles.get_mut(id) {
                        particle.position = geometry::rotate_about(&particle.position, rotation, pivot);
                    }
                }
                ChildRef::Port(id) => {
                    if let Some(port) = self.ports.get_mut(id) {
                        rotate_port_in_place(port, rotation, pivot);
                    }
                }
                ChildRef::Node(id) => {
                    if let Some(n) = self.nodes.get_mut(id) {
                        n.origin = geometry::rotate_about(&n.origin, rotation, pivot);
                    }
                }
            }
        }
    }

    /// Rotates a single port (position and orientation) about `pivot`, leaving the rest of
    /// the compound untouched.
    pub(crate) fn rotate_port(
        &mut self,
        port: PortId,
        rotation: &Rotation3<f64>,
        pivot: &Point3<f64>,
    ) -> Result<(), ModelError> {
        let port = self
            .ports
            .get_mut(port)
            .ok_or(ModelError::PortNotFound(port))?;
        rotate_port_in_place(port, rotation, pivot);
        Ok(())
    }

    fn node_or_err(&self, node: NodeId) -> Result<&Node, ModelError> {
        self.nodes.get(node).ok_or(ModelError::NodeNotFound(node))
    }
}

fn rotate_port_in_place(port: &mut Port, rotation: &Rotation3<f64>, pivot: &Point3<f64>) {
    port.position = geometry::rotate_about(&port.position, rotation, pivot);
    port.orientation = Unit::new_normalize(rotation * port.orientation.into_inner());
}

fn unit_axis(axis: &Vector3<f64>) -> Result<Unit<Vector3<f64>>, ModelError> {
    let degenerate = ModelError::DegenerateOrientation {
        x: axis.x,
        y: axis.y,
        z: axis.z,
    };
    if !axis.iter().all(|c| c.is_finite()) {
        return Err(degenerate);
    }
    Unit::try_new(*axis, f64::EPSILON).ok_or(degenerate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    fn assert_point_close(actual: &Point3<f64>, expected: &Point3<f64>) {
        assert!(
            (actual - expected).norm() < TOLERANCE,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    fn pairwise_distances(compound: &Compound) -> Vec<f64> {
        let positions = compound.positions();
        let mut distances = Vec::new();
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                distances.push((positions[i] - positions[j]).norm());
            }
        }
        distances
    }

    /// A bent three-particle fragment with one port on each terminal particle.
    fn bent_fragment() -> (Compound, ParticleId, PortId, PortId) {
        let mut compound = Compound::new("Fragment");
        let root = compound.root();
        let a = compound
            .add_particle(root, Some("A"), Particle::new("C", Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        compound
            .add_particle(root, Some("B"), Particle::new("C", Point3::new(0.15, 0.0, 0.0)))
            .unwrap();
        let c = compound
            .add_particle(root, Some("C"), Particle::new("O", Point3::new(0.2, 0.12, 0.0)))
            .unwrap();
        let up = compound
            .add_port(
                root,
                Some("up"),
                PortSpec::outward(Anchor::Particle(a), Vector3::new(-0.07, 0.0, 0.0)),
            )
            .unwrap();
        let down = compound
            .add_port(
                root,
                Some("down"),
                PortSpec::outward(Anchor::Particle(c), Vector3::new(0.0, 0.07, 0.0)),
            )
            .unwrap();
        (compound, a, up, down)
    }

    mod labels {
        use super::*;

        #[test]
        fn explicit_labels_are_unique_within_scope() {
            let mut compound = Compound::new("Test");
            let root = compound.root();
            compound
                .add_particle(root, Some("C"), Particle::new("C", Point3::origin()))
                .unwrap();
            let result = compound.add_particle(root, Some("C"), Particle::new("C", Point3::origin()));
            assert_eq!(
                result,
                Err(ModelError::LabelCollision {
                    label: "C".to_string()
                })
            );
            assert_eq!(compound.particle_count(), 1);
        }

        #[test]
        fn counter_labels_number_siblings_in_order() {
            let mut compound = Compound::new("Test");
            let root = compound.root();
            let ids: Vec<ParticleId> = (0..3)
                .map(|i| {
                    compound
                        .add_particle(
                            root,
                            Some("H[$]"),
                            Particle::new("H", Point3::new(i as f64, 0.0, 0.0)),
                        )
                        .unwrap()
                })
                .collect();

            let labels: Vec<&str> = compound
                .node(root)
                .unwrap()
                .children()
                .iter()
                .map(|c| c.label.as_str())
                .collect();
            assert_eq!(labels, vec!["H[0]", "H[1]", "H[2]"]);
            assert_eq!(compound.particle_by_label(root, "H[1]"), Some(ids[1]));
            let group: Vec<ChildRef> = ids.iter().map(|&id| ChildRef::Particle(id)).collect();
            assert_eq!(compound.group(root, "H"), group.as_slice());
        }

        #[test]
        fn default_labels_use_counter_suffix() {
            let mut compound = Compound::new("Test");
            let root = compound.root();
            let c = compound
                .add_particle(root, None, Particle::new("C", Point3::origin()))
                .unwrap();
            compound
                .add_port(root, None, PortSpec::outward(Anchor::Particle(c), Vector3::x()))
                .unwrap();
            compound
                .add_compound(root, None, Compound::new("CH2"))
                .unwrap();

            let node = compound.node(root).unwrap();
            assert!(node.child("C[0]").is_some());
            assert!(node.child("port[0]").is_some());
            assert!(node.child("CH2[0]").is_some());
        }

        #[test]
        fn counter_label_collides_with_explicit_label() {
            let mut compound = Compound::new("Test");
            let root = compound.root();
            compound
                .add_particle(root, Some("H[0]"), Particle::new("H", Point3::origin()))
                .unwrap();
            let result = compound.add_particle(root, Some("H[$]"), Particle::new("H", Point3::origin()));
            assert!(matches!(result, Err(ModelError::LabelCollision { .. })));
        }

        #[test]
        fn unknown_parent_is_rejected() {
            let (mut compound, ..) = bent_fragment();
            let mut other = Compound::new("Other");
            let stray = other.add_compound(other.root(), Some("x"), Compound::new("x")).unwrap();
            let result = compound.add_particle(stray, None, Particle::new("C", Point3::origin()));
            assert_eq!(result, Err(ModelError::NodeNotFound(stray)));
        }
    }

    mod hierarchy {
        use super::*;

        #[test]
        fn add_compound_preserves_labels_anchors_and_bonds() {
            let (mut fragment, a, ..) = bent_fragment();
            let root = fragment.root();
            let b = fragment.particle_by_label(root, "B").unwrap();
            fragment.add_bond(a, b).unwrap();

            let mut parent = Compound::new("Parent");
            let parent_root = parent.root();
            let node = parent
                .add_compound(parent_root, Some("frag[$]"), fragment)
                .unwrap();

            assert_eq!(parent.node_by_label(parent_root, "frag[0]"), Some(node));
            assert_eq!(parent.node(node).unwrap().parent(), Some(parent_root));
            assert_eq!(parent.particle_count(), 3);
            assert_eq!(parent.port_count(), 2);
            assert_eq!(parent.bonds().len(), 1);

            let new_a = parent.particle_by_label(node, "A").unwrap();
            let up = parent.port_by_label(node, "up").unwrap();
            assert_eq!(parent.anchor(up), Some(Anchor::Particle(new_a)));
            assert_eq!(parent.particle(new_a).unwrap().parent(), Some(node));
            assert_eq!(parent.bonded_neighbors(new_a).unwrap().len(), 1);
        }

        #[test]
        fn contains_walks_up_the_hierarchy() {
            let (fragment, ..) = bent_fragment();
            let mut parent = Compound::new("Parent");
            let parent_root = parent.root();
            let first = parent.add_compound(parent_root, None, fragment.clone()).unwrap();
            let second = parent.add_compound(parent_root, None, fragment).unwrap();

            let port = parent.port_by_label(first, "up").unwrap();
            assert!(parent.contains(first, ChildRef::Port(port)));
            assert!(parent.contains(parent_root, ChildRef::Port(port)));
            assert!(!parent.contains(second, ChildRef::Port(port)));
            assert!(parent.contains(first, ChildRef::Node(first)));
        }

        #[test]
        fn traversal_is_depth_first_in_insertion_order() {
            let mut inner = Compound::new("Inner");
            let inner_root = inner.root();
            inner
                .add_particle(inner_root, None, Particle::new("N", Point3::origin()))
                .unwrap();

            let mut outer = Compound::new("Outer");
            let root = outer.root();
            outer
                .add_particle(root, None, Particle::new("C", Point3::origin()))
                .unwrap();
            outer.add_compound(root, None, inner).unwrap();
            outer
                .add_particle(root, None, Particle::new("O", Point3::origin()))
                .unwrap();

            let names: Vec<&str> = outer.particles().map(|(_, p)| p.name.as_str()).collect();
            assert_eq!(names, vec!["C", "N", "O"]);
        }

        #[test]
        fn add_child_dispatches_on_the_child_kind() {
            let mut compound = Compound::new("Host");
            let root = compound.root();

            let particle = compound
                .add_child(root, Some("p"), Particle::new("C", Point3::origin()))
                .unwrap();
            let ChildRef::Particle(particle_id) = particle else {
                panic!("expected a particle, got {:?}", particle);
            };
            let port = compound
                .add_child(
                    root,
                    Some("site"),
                    PortSpec::outward(Anchor::Particle(particle_id), Vector3::x()),
                )
                .unwrap();
            assert!(matches!(port, ChildRef::Port(_)));
            let (fragment, ..) = bent_fragment();
            let node = compound.add_child(root, None, fragment).unwrap();
            assert!(matches!(node, ChildRef::Node(_)));

            let host = compound.node(root).unwrap();
            assert_eq!(host.child("p"), Some(particle));
            assert_eq!(host.child("site"), Some(port));
            assert_eq!(host.child("Fragment[0]"), Some(node));
            assert_eq!(compound.particle_count(), 4);
            assert_eq!(compound.port_count(), 3);

            let duplicate = compound.add_child(
                root,
                Some("p"),
                Child::from(Particle::new("N", Point3::origin())),
            );
            assert!(matches!(duplicate, Err(ModelError::LabelCollision { .. })));
            assert_eq!(compound.particle_count(), 4);
            assert_eq!(compound.node(root).unwrap().children().len(), 3);
            assert_eq!(compound.node(root).unwrap().child("p"), Some(particle));
        }

        #[test]
        fn add_bond_is_idempotent() {
            let (mut fragment, a, ..) = bent_fragment();
            let b = fragment.particle_by_label(fragment.root(), "B").unwrap();
            fragment.add_bond(a, b).unwrap();
            fragment.add_bond(b, a).unwrap();
            assert_eq!(fragment.bonds().len(), 1);
            assert_eq!(fragment.bonded_neighbors(a).unwrap(), &[b]);
        }
    }

    mod ports {
        use super::*;

        #[test]
        fn port_is_placed_relative_to_its_anchor() {
            let (fragment, a, up, _) = bent_fragment();
            let port = fragment.port(up).unwrap();
            assert_point_close(port.position(), &Point3::new(-0.07, 0.0, 0.0));
            assert_eq!(port.orientation().into_inner(), -Vector3::x());
            assert_eq!(fragment.anchor(up), Some(Anchor::Particle(a)));
            assert_point_close(&fragment.anchor_position(up).unwrap(), &Point3::origin());
        }

        #[test]
        fn node_anchor_resolves_to_centroid() {
            let mut compound = Compound::new("Test");
            let root = compound.root();
            compound
                .add_particle(root, None, Particle::new("C", Point3::new(-1.0, 0.0, 0.0)))
                .unwrap();
            compound
                .add_particle(root, None, Particle::new("C", Point3::new(1.0, 2.0, 0.0)))
                .unwrap();
            let port = compound
                .add_port(
                    root,
                    None,
                    PortSpec::new(Anchor::Node(root), Vector3::z(), Vector3::z()),
                )
                .unwrap();
            assert_point_close(compound.port(port).unwrap().position(), &Point3::new(0.0, 1.0, 1.0));
        }

        #[test]
        fn missing_anchor_or_zero_orientation_leaves_compound_unchanged() {
            let (mut fragment, ..) = bent_fragment();
            let root = fragment.root();
            let mut other = Compound::new("Other");
            let other_root = other.root();
            let stray = (0..5)
                .map(|_| {
                    other
                        .add_particle(other_root, None, Particle::new("X", Point3::origin()))
                        .unwrap()
                })
                .last()
                .unwrap();

            let missing = fragment.add_port(
                root,
                Some("p"),
                PortSpec::outward(Anchor::Particle(stray), Vector3::x()),
            );
            assert_eq!(missing, Err(ModelError::ParticleNotFound(stray)));

            let a = fragment.particle_by_label(root, "A").unwrap();
            let degenerate = fragment.add_port(
                root,
                Some("p"),
                PortSpec::new(Anchor::Particle(a), Vector3::x(), Vector3::zeros()),
            );
            assert!(matches!(
                degenerate,
                Err(ModelError::DegenerateOrientation { .. })
            ));
            assert_eq!(fragment.port_count(), 2);
            assert!(fragment.node(root).unwrap().child("p").is_none());
        }

        #[test]
        fn available_ports_excludes_used_ones() {
            let (mut fragment, _, up, down) = bent_fragment();
            fragment.port_mut(up).unwrap().mark_used();
            let available: Vec<PortId> = fragment.available_ports().map(|(id, _)| id).collect();
            assert_eq!(available, vec![down]);
            let used: Vec<PortId> = fragment.used_ports().map(|(id, _)| id).collect();
            assert_eq!(used, vec![up]);
            assert_eq!(fragment.ports().count(), 2);
        }
    }

    mod kernel {
        use super::*;

        #[test]
        fn translate_moves_particles_ports_and_origins() {
            let (mut fragment, a, up, _) = bent_fragment();
            let offset = Vector3::new(1.0, -2.0, 0.5);
            fragment.translate(&offset);

            assert_point_close(&fragment.particle(a).unwrap().position, &Point3::new(1.0, -2.0, 0.5));
            assert_point_close(fragment.port(up).unwrap().position(), &Point3::new(0.93, -2.0, 0.5));
            assert_point_close(
                fragment.node(fragment.root()).unwrap().origin(),
                &Point3::new(1.0, -2.0, 0.5),
            );
        }

        #[test]
        fn rotation_turns_port_orientations() {
            let (mut fragment, _, up, _) = bent_fragment();
            fragment.rotate(Axis::Z, PI / 2.0);
            let orientation = fragment.port(up).unwrap().orientation().into_inner();
            assert!((orientation - (-Vector3::y())).norm() < TOLERANCE);
        }

        #[test]
        fn rotation_is_about_the_local_origin() {
            let (mut fragment, a, ..) = bent_fragment();
            fragment.translate(&Vector3::new(5.0, 0.0, 0.0));
            fragment.rotate(Axis::Z, PI);
            // The origin travelled with the compound, so particle A (at the origin) stays put.
            assert_point_close(&fragment.particle(a).unwrap().position, &Point3::new(5.0, 0.0, 0.0));
        }

        #[test]
        fn sequential_rotations_are_order_dependent() {
            let (mut xz, ..) = bent_fragment();
            let (mut zx, ..) = bent_fragment();
            xz.rotate(Axis::X, 0.3);
            xz.rotate(Axis::Z, 0.4);
            zx.rotate(Axis::Z, 0.4);
            zx.rotate(Axis::X, 0.3);
            let diff = geometry::calculate_rmsd(&xz.positions(), &zx.positions()).unwrap();
            assert!(diff > 1e-3);
        }

        #[test]
        fn transforms_preserve_pairwise_distances() {
            let (mut fragment, ..) = bent_fragment();
            let before = pairwise_distances(&fragment);

            fragment.rotate(Axis::X, 0.7);
            fragment.translate(&Vector3::new(0.3, 0.1, -4.0));
            fragment.rotate(Axis::Y, -1.3);
            fragment.spin(&Vector3::new(1.0, 1.0, 1.0), 2.1).unwrap();
            fragment.rotate(Axis::Z, 0.05);

            let after = pairwise_distances(&fragment);
            for (b, a) in before.iter().zip(after.iter()) {
                assert!((b - a).abs() < TOLERANCE);
            }
        }

        #[test]
        fn rotate_node_only_touches_the_subtree() {
            let (fragment, ..) = bent_fragment();
            let mut parent = Compound::new("Parent");
            let root = parent.root();
            let left = parent.add_compound(root, None, fragment.clone()).unwrap();
            let right = parent.add_compound(root, None, fragment).unwrap();
            parent.translate_node(right, &Vector3::new(2.0, 0.0, 0.0)).unwrap();

            let right_before: Vec<Point3<f64>> = parent
                .descendants(right)
                .into_iter()
                .filter_map(|c| match c {
                    ChildRef::Particle(id) => Some(parent.particle(id).unwrap().position),
                    _ => None,
                })
                .collect();

            parent.rotate_node(left, Axis::Z, 1.0).unwrap();

            let right_after: Vec<Point3<f64>> = parent
                .descendants(right)
                .into_iter()
                .filter_map(|c| match c {
                    ChildRef::Particle(id) => Some(parent.particle(id).unwrap().position),
                    _ => None,
                })
                .collect();
            assert_eq!(right_before, right_after);
            assert_point_close(parent.node(right).unwrap().origin(), &Point3::new(2.0, 0.0, 0.0));
        }

        #[test]
        fn spin_keeps_the_centroid_fixed() {
            let (mut fragment, ..) = bent_fragment();
            let center = fragment.center().unwrap();
            fragment.spin(&Vector3::new(0.0, 1.0, 1.0), 1.234).unwrap();
            assert_point_close(&fragment.center().unwrap(), &center);
            assert!(matches!(
                fragment.spin(&Vector3::zeros(), 1.0),
                Err(ModelError::DegenerateOrientation { .. })
            ));
        }

        #[test]
        fn translate_to_moves_the_centroid() {
            let (mut fragment, ..) = bent_fragment();
            let target = Point3::new(3.0, 3.0, 3.0);
            fragment.translate_to(&target);
            assert_point_close(&fragment.center().unwrap(), &target);
        }

        #[test]
        fn center_of_empty_compound_is_none() {
            let compound = Compound::new("Empty");
            assert!(compound.center().is_none());
            assert_eq!(compound.center_of(compound.root()), Ok(None));
        }
    }

    mod cloning {
        use super::*;

        #[test]
        fn clone_is_deep_and_independent() {
            let (original, a, up, _) = bent_fragment();
            let before = original.positions();

            let mut copy = original.clone();
            copy.rotate(Axis::Y, 0.9);
            copy.translate(&Vector3::new(1.0, 1.0, 1.0));
            copy.port_mut(up).unwrap().mark_used();

            assert_eq!(original.positions(), before);
            assert!(!original.port(up).unwrap().is_used());
            assert_ne!(copy.particle(a).unwrap().position, original.particle(a).unwrap().position);
        }

        #[test]
        fn clone_keeps_ids_valid() {
            let (original, a, up, down) = bent_fragment();
            let copy = original.clone();
            assert_eq!(copy.particle(a), original.particle(a));
            assert_eq!(copy.port(up), original.port(up));
            assert_eq!(copy.port(down), original.port(down));
        }
    }
}
