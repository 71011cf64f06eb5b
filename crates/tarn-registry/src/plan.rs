//! Dependency planning.
//!
//! Commands reachable from the requested one are interned into a small arena
//! and visited depth-first with a three-state mark, producing the order in
//! which bodies run. Planning never runs a body, so cycles and unknown
//! dependencies are reported before anything executes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::Command;
use crate::error::ExecuteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Arena {
    nodes: Vec<Arc<Command>>,
    marks: Vec<Mark>,
    index: HashMap<String, usize>,
}

impl Arena {
    fn intern(&mut self, cmd: Arc<Command>) -> usize {
        if let Some(&idx) = self.index.get(cmd.full_name()) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(cmd.full_name().to_string(), idx);
        self.nodes.push(cmd);
        self.marks.push(Mark::Unvisited);
        idx
    }
}

/// Order in which `root` and its dependencies must run.
///
/// Dependencies come first, depth-first and left-to-right; each command
/// appears once and `root` is always last. `lookup` resolves a dependency
/// name (aliases included) to a registered command.
pub fn execution_order<F>(root: Arc<Command>, lookup: F) -> Result<Vec<Arc<Command>>, ExecuteError>
where
    F: Fn(&str) -> Option<Arc<Command>>,
{
    let mut arena = Arena {
        nodes: Vec::new(),
        marks: Vec::new(),
        index: HashMap::new(),
    };
    let mut order = Vec::new();
    let mut chain = Vec::new();

    let root_idx = arena.intern(root);
    visit(root_idx, &mut arena, &lookup, &mut chain, &mut order)?;

    Ok(order.into_iter().map(|idx| Arc::clone(&arena.nodes[idx])).collect())
}

fn visit<F>(
    idx: usize,
    arena: &mut Arena,
    lookup: &F,
    chain: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), ExecuteError>
where
    F: Fn(&str) -> Option<Arc<Command>>,
{
    match arena.marks[idx] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            let start = chain.iter().position(|&i| i == idx).unwrap_or(0);
            let mut names: Vec<String> = chain[start..]
                .iter()
                .map(|&i| arena.nodes[i].full_name().to_string())
                .collect();
            names.push(arena.nodes[idx].full_name().to_string());
            return Err(ExecuteError::Cycle { chain: names });
        }
        Mark::Unvisited => {}
    }

    arena.marks[idx] = Mark::InProgress;
    chain.push(idx);

    let dependencies = arena.nodes[idx].dependencies().to_vec();
    for dependency in dependencies {
        let cmd = lookup(&dependency).ok_or_else(|| ExecuteError::UnknownDependency {
            command: arena.nodes[idx].full_name().to_string(),
            dependency: dependency.clone(),
        })?;
        let dep_idx = arena.intern(cmd);
        visit(dep_idx, arena, lookup, chain, order)?;
    }

    chain.pop();
    arena.marks[idx] = Mark::Done;
    order.push(idx);
    Ok(())
}
