//! Declares the set of probes for one instrumentation unit, prepares their
//! buffer readers, attaches programs to kernel hooks, and counts attached
//! probes. Mirrors the source project's `Module`/`ProgramInfo`/`Handler`
//! split: `Module` is a declaration, `Handler` is the live, attach-ready
//! result of `prepare()`.

use crate::error::SetupError;
use crate::probe::ProbeHandle;
use std::any::Any;
use std::sync::Arc;

/// Opaque capability the core consumes to bind a compiled kernel program to
/// a hook point (kprobe, tracepoint, ...). The core never interprets hook
/// kinds; it only calls `attach_probe`.
pub trait HookInfo: Send + Sync {
    fn attach_probe(&self, program_name: &str) -> Result<ProbeLink, SetupError>;
    fn hook_name(&self) -> &str;
}

/// An attached kernel link. Carries no behavior the core depends on beyond
/// existing; dropping it is how an implementation would detach. Modeled as
/// an opaque `Any` box so a `Handler` can hold links for programs it knows
/// nothing else about.
pub type ProbeLink = Box<dyn Any + Send>;

/// Capability that knows how to materialise buffer readers for a declared
/// map (ring buffer or perf event array).
pub trait MapInfo: Send + Sync {
    fn map_name(&self) -> &str;
    fn create_readers(&self) -> Result<Vec<Box<dyn ProbeHandle>>, SetupError>;
}

pub struct ProgramInfo {
    pub name: String,
    pub hook: Arc<dyn HookInfo>,
    pub should_attach: bool,
}

impl ProgramInfo {
    pub fn new(name: impl Into<String>, hook: Arc<dyn HookInfo>) -> Self {
        Self {
            name: name.into(),
            hook,
            should_attach: true,
        }
    }

    /// Builder: mark this program to be attached. Programs default to
    /// enabled; this exists for symmetry with [`Self::disabled`] when a
    /// program list is built conditionally.
    pub fn enabled(mut self) -> Self {
        self.should_attach = true;
        self
    }

    /// Builder: exclude this program from `attach()` without removing it
    /// from the module (e.g. a probe gated by config).
    pub fn disabled(mut self) -> Self {
        self.should_attach = false;
        self
    }
}

/// The live result of [`Module::prepare`]: owns the buffer readers and
/// accumulates probe links as [`Module::attach`] binds each program.
/// Cleanup (closing readers, dropping links) is this struct's
/// responsibility, not `Module`'s.
pub struct Handler {
    pub module_name: String,
    pub readers: Vec<Box<dyn ProbeHandle>>,
    pub links: Vec<ProbeLink>,
    pub should_attach_count: usize,
}

pub struct Module {
    name: String,
    programs: Vec<ProgramInfo>,
    map: Option<Arc<dyn MapInfo>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            programs: Vec::new(),
            map: None,
        }
    }

    /// Builder: declare a program. No side effects until `prepare`/`attach`.
    pub fn add_program(mut self, program: ProgramInfo) -> Self {
        self.programs.push(program);
        self
    }

    /// Builder: declare the map whose readers `prepare()` will materialise.
    pub fn set_map(mut self, map: Arc<dyn MapInfo>) -> Self {
        self.map = Some(map);
        self
    }

    /// Number of programs that will be attached when `attach()` runs.
    pub fn count(&self) -> usize {
        self.programs.iter().filter(|p| p.should_attach).count()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn programs(&self) -> &[ProgramInfo] {
        &self.programs
    }

    /// Creates buffer readers (if a map was declared) and returns a fresh
    /// `Handler` ready for `attach()`.
    pub fn prepare(&self) -> Result<Handler, SetupError> {
        let readers = match &self.map {
            Some(map) => map.create_readers()?,
            None => Vec::new(),
        };
        Ok(Handler {
            module_name: self.name.clone(),
            readers,
            links: Vec::new(),
            should_attach_count: self.count(),
        })
    }

    /// Attaches every `should_attach` program to its hook, pushing each
    /// resulting link onto `handler`. A failure aborts the loop and
    /// propagates, but links already pushed stay live — the caller owns
    /// `handler` and is responsible for tearing it down.
    pub fn attach(&self, handler: &mut Handler) -> Result<(), SetupError> {
        for program in &self.programs {
            if !program.should_attach {
                continue;
            }
            let link = program.hook.attach_probe(&program.name)?;
            handler.links.push(link);
        }
        Ok(())
    }
}
