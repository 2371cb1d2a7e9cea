use tracing::{debug, info};

use crate::{
    design::{Instance, ModuleDesc, ModuleSource},
    netlist::{Level, LevelId, Netlist, NodeRef},
    node::Node,
    store::SaveQueue,
    Error, Result,
};

/// Instantiates a module hierarchy into a [`Netlist`], one level per module
/// instance. Every node gets marker fields of `width` bits, one per ACE rule.
pub struct Builder<'a, S: ModuleSource + ?Sized> {
    source: &'a S,
    width: usize,
    queue: Option<&'a SaveQueue>,
    netlist: Netlist,
    stack: Vec<String>,
}

impl<'a, S: ModuleSource + ?Sized> Builder<'a, S> {
    pub fn new(source: &'a S, width: usize) -> Self {
        Self {
            source,
            width,
            queue: None,
            netlist: Netlist::new(),
            stack: Vec::new(),
        }
    }

    /// Hands every finished level to `queue`.
    pub fn with_queue(mut self, queue: &'a SaveQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn build(mut self, top: &str) -> Result<Netlist> {
        self.build_level(top, top.to_string(), 0, None)?;
        info!("Built {}", self.netlist);

        Ok(self.netlist)
    }

    fn build_level(
        &mut self,
        module_name: &str,
        name: String,
        depth: usize,
        parent: Option<LevelId>,
    ) -> Result<LevelId> {
        if self.stack.iter().any(|module| module == module_name) {
            return Err(Error::RecursiveModule(module_name.to_string()));
        }
        let source = self.source;
        let module = source.module(module_name)?;

        self.stack.push(module_name.to_string());
        let level_id = self
            .netlist
            .add_level(Level::new(name, module_name, depth, parent));

        self.add_ports(level_id, module)?;
        self.add_wires(level_id, module)?;
        for inst in &module.insts {
            if inst.is_prim {
                self.add_prim(level_id, inst)?;
            } else {
                self.add_subnet(level_id, inst, depth)?;
            }
        }
        self.stack.pop();

        if let Some(queue) = self.queue {
            queue.enqueue(self.netlist.record(level_id))?;
        }
        debug!("Done ({depth}) {module_name:?}");

        Ok(level_id)
    }

    fn add_ports(&mut self, level_id: LevelId, module: &ModuleDesc) -> Result<()> {
        let level = &mut self.netlist[level_id];
        for port in module.ordered_ports() {
            level.add_node(Node::port(
                port.name.as_str(),
                port.direction,
                self.width,
            )?)?;
        }
        Ok(())
    }

    fn add_wires(&mut self, level_id: LevelId, module: &ModuleDesc) -> Result<()> {
        let level = &mut self.netlist[level_id];
        for conn in module.insts.iter().flat_map(|inst| inst.conns.iter()) {
            if !level.contains(&conn.actual) {
                level.add_node(Node::wire(conn.actual.as_str(), self.width)?)?;
            }
        }
        Ok(())
    }

    fn actual(&self, level_id: LevelId, name: &str) -> Result<NodeRef> {
        let level = &self.netlist[level_id];
        level
            .node_id(name)
            .map(|node_id| NodeRef::new(level_id, node_id))
            .ok_or_else(|| Error::MissingActual {
                level: level.name.clone(),
                name: name.to_string(),
            })
    }

    fn add_prim(&mut self, level_id: LevelId, inst: &Instance) -> Result<()> {
        let prim = self.netlist[level_id].add_node(Node::prim(
            inst.name.as_str(),
            inst.ty.as_str(),
            inst.is_seq,
            self.width,
        )?)?;
        let prim = NodeRef::new(level_id, prim);

        for conn in &inst.conns {
            let actual = self.actual(level_id, &conn.actual)?;
            self.netlist[level_id].connect_pin(conn.direction, actual, prim);
        }
        Ok(())
    }

    fn add_subnet(&mut self, level_id: LevelId, inst: &Instance, depth: usize) -> Result<()> {
        let name = format!("{}/{}", self.netlist[level_id].name, inst.name);
        let subnet_id =
            self.build_level(&inst.ty, name.clone(), depth + 1, Some(level_id))?;
        self.netlist[level_id].subnets.insert(name.clone(), subnet_id);

        for conn in &inst.conns {
            let actual = self.actual(level_id, &conn.actual)?;

            let subnet = &self.netlist[subnet_id];
            let formal = subnet.port_at(conn.position).ok_or_else(|| {
                Error::PortPosOutOfRange {
                    pos: conn.position,
                    subnet: name.clone(),
                    level: self.netlist[level_id].name.clone(),
                    count: subnet.port_count(),
                }
            })?;

            self.netlist[level_id].connect_pin(
                conn.direction,
                actual,
                NodeRef::new(subnet_id, formal),
            );
        }
        Ok(())
    }
}
