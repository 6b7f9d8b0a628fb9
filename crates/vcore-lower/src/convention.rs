//! # Calling Convention
//!
//! Decides where each parameter and result of a signature lives at the call
//! boundary. A [`CallingConvention`] is an immutable table built once from the
//! target configuration; a [`ConventionState`] walks one signature's parameters in
//! order and is discarded afterwards, so every signature starts from the same
//! state and assignment is a pure function of the signature.
//!
//! Placement rules:
//!
//! * `i1`, `i8` and `i16` travel in a full 32-bit location and are truncated back
//!   after being read.
//! * `i32` and `f32` take the next free argument register, then a 4-byte stack slot.
//! * `i64` takes two consecutive locations, low half first. When only one register
//!   is left, [`WidePolicy`] decides between splitting across register and stack,
//!   or moving the whole value (and everything after it) to the stack.
//! * Under [`VariadicPolicy::Stack`], every variadic argument goes on the stack and
//!   leaves the registers untouched.
//! * Incoming stack slots are 4 bytes wide and numbered from offset 0 upwards in
//!   parameter order.

use std::fmt;

use vcore_dag::{PhysReg, ValueKind};

use crate::config::{ConfigError, ConventionConfig, VariadicPolicy, WidePolicy};
use crate::error::{LoweringError, ValuePosition};

/// Size of one stack slot and of one general purpose register, in bytes.
pub const WORD_BYTES: u32 = 4;

/// Number of general purpose registers.
pub const GPR_COUNT: u16 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegClass {
    /// 32-bit general purpose registers `r0`..`r31`.
    Gpr,
}

/// One physical location of a value (or of one half of a split value).
///
/// `kind` is the kind of the location, which is wider than the value's own kind
/// when a narrow integer was promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationDescriptor {
    Register { class: RegClass, reg: PhysReg, kind: ValueKind },
    Stack { offset: u32, kind: ValueKind },
}

impl LocationDescriptor {
    pub fn kind(&self) -> ValueKind {
        match self {
            LocationDescriptor::Register { kind, .. } | LocationDescriptor::Stack { kind, .. } => *kind,
        }
    }

    pub fn reg(&self) -> Option<PhysReg> {
        match self {
            LocationDescriptor::Register { reg, .. } => Some(*reg),
            LocationDescriptor::Stack { .. } => None,
        }
    }

    pub fn is_stack(&self) -> bool {
        matches!(self, LocationDescriptor::Stack { .. })
    }
}

impl fmt::Display for LocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationDescriptor::Register { reg, kind, .. } => write!(f, "{}:{}", reg, kind),
            LocationDescriptor::Stack { offset, kind } => write!(f, "[fp+{}]:{}", offset, kind),
        }
    }
}

/// Where a whole declared value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgLocation {
    /// The value occupies one location, possibly promoted to a wider kind.
    Direct { value: ValueKind, loc: LocationDescriptor },
    /// A 64-bit value split into two 32-bit halves, low half first.
    Split { value: ValueKind, lo: LocationDescriptor, hi: LocationDescriptor },
}

impl ArgLocation {
    /// The declared kind of the value.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ArgLocation::Direct { value, .. } | ArgLocation::Split { value, .. } => *value,
        }
    }

    /// The locations used, in order.
    pub fn parts(&self) -> Vec<LocationDescriptor> {
        match self {
            ArgLocation::Direct { loc, .. } => vec![*loc],
            ArgLocation::Split { lo, hi, .. } => vec![*lo, *hi],
        }
    }
}

/// How results leave a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnPlan {
    /// No results.
    Void,
    /// Every result fits in the result registers.
    Registers(Vec<ArgLocation>),
    /// Results are stored through a hidden pointer the caller passes in `pointer`;
    /// the pointer itself is handed back in `result_reg`.
    Indirect {
        pointer: PhysReg,
        result_reg: PhysReg,
        /// Byte offset of each result in the caller-provided area.
        offsets: Vec<u32>,
        size: u32,
    },
}

/// How a value kind is passed, before any register is picked.
enum Passing {
    /// One 32-bit location of the given kind.
    Word(ValueKind),
    /// Two 32-bit halves.
    Pair,
}

fn passing(kind: ValueKind) -> Option<Passing> {
    match kind {
        ValueKind::Int(1 | 8 | 16 | 32) => Some(Passing::Word(ValueKind::I32)),
        ValueKind::Float(32) => Some(Passing::Word(ValueKind::F32)),
        ValueKind::Int(64) => Some(Passing::Pair),
        _ => None,
    }
}

/// The immutable convention table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallingConvention {
    arg_registers: Vec<PhysReg>,
    return_registers: Vec<PhysReg>,
    wide_values: WidePolicy,
    variadic: VariadicPolicy,
    return_via_pointer: bool,
}

impl Default for CallingConvention {
    fn default() -> Self {
        CallingConvention {
            arg_registers: (0..6).map(PhysReg).collect(),
            return_registers: vec![PhysReg(0), PhysReg(1)],
            wide_values: WidePolicy::Split,
            variadic: VariadicPolicy::Stack,
            return_via_pointer: true,
        }
    }
}

/// Parses a register name of the form `rN`.
pub fn parse_register(name: &str) -> Result<PhysReg, ConfigError> {
    let bad = || ConfigError::BadRegister(name.to_string());
    let digits = name.strip_prefix('r').ok_or_else(bad)?;
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return Err(bad());
    }
    let number: u16 = digits.parse().map_err(|_| bad())?;
    if number >= GPR_COUNT {
        return Err(bad());
    }
    Ok(PhysReg(number))
}

fn parse_register_list(names: &[String], list: &'static str) -> Result<Vec<PhysReg>, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::EmptyRegisterList(list));
    }
    let mut regs: Vec<PhysReg> = Vec::with_capacity(names.len());
    for name in names {
        let reg = parse_register(name)?;
        if regs.contains(&reg) {
            return Err(ConfigError::DuplicateRegister { register: name.clone(), list });
        }
        regs.push(reg);
    }
    Ok(regs)
}

impl CallingConvention {
    pub fn from_config(config: &ConventionConfig) -> Result<Self, ConfigError> {
        Ok(CallingConvention {
            arg_registers: parse_register_list(&config.arg_registers, "arg_registers")?,
            return_registers: parse_register_list(&config.return_registers, "return_registers")?,
            wide_values: config.wide_values,
            variadic: config.variadic,
            return_via_pointer: config.return_via_pointer,
        })
    }

    pub fn arg_registers(&self) -> &[PhysReg] {
        &self.arg_registers
    }

    pub fn return_registers(&self) -> &[PhysReg] {
        &self.return_registers
    }

    pub fn wide_values(&self) -> WidePolicy {
        self.wide_values
    }

    pub fn variadic(&self) -> VariadicPolicy {
        self.variadic
    }

    /// Starts assigning the parameters of one signature.
    pub fn begin<'a>(&'a self, function: &'a str) -> ConventionState<'a> {
        ConventionState {
            convention: self,
            function,
            next_reg: 0,
            registers_closed: false,
            stack_offset: 0,
            next_index: 0,
        }
    }

    /// Decides how the declared results of `function` are returned.
    ///
    /// Results are tried against the result registers in order. If they do not
    /// fit and the convention allows it, the whole result list is returned through
    /// a caller-provided area instead.
    pub fn plan_results(&self, function: &str, results: &[ValueKind]) -> Result<ReturnPlan, LoweringError> {
        if results.is_empty() {
            return Ok(ReturnPlan::Void);
        }

        let mut locations = Vec::with_capacity(results.len());
        let mut next = 0usize;
        let mut overflow = None;
        for (index, kind) in results.iter().enumerate() {
            let position = ValuePosition::Result(index as u32);
            let passing = passing(*kind).ok_or_else(|| LoweringError::convention_gap(function, position, *kind))?;
            let needed = match passing {
                Passing::Word(_) => 1,
                Passing::Pair => 2,
            };
            if next + needed > self.return_registers.len() {
                overflow.get_or_insert((position, *kind));
                continue;
            }
            let reg = |i: usize, kind| LocationDescriptor::Register {
                class: RegClass::Gpr,
                reg: self.return_registers[i],
                kind,
            };
            locations.push(match passing {
                Passing::Word(loc_kind) => ArgLocation::Direct { value: *kind, loc: reg(next, loc_kind) },
                Passing::Pair => ArgLocation::Split {
                    value: *kind,
                    lo: reg(next, ValueKind::I32),
                    hi: reg(next + 1, ValueKind::I32),
                },
            });
            next += needed;
        }

        let Some((position, kind)) = overflow else {
            return Ok(ReturnPlan::Registers(locations));
        };
        if !self.return_via_pointer {
            return Err(LoweringError::convention_gap(function, position, kind));
        }

        let mut offsets = Vec::with_capacity(results.len());
        let mut size = 0u32;
        for kind in results {
            offsets.push(size);
            // Every result kind was classified above, so it has a store size.
            let bytes = kind.store_size().unwrap_or(WORD_BYTES);
            size += bytes.div_ceil(WORD_BYTES) * WORD_BYTES;
        }
        Ok(ReturnPlan::Indirect {
            pointer: self.arg_registers[0],
            result_reg: self.return_registers[0],
            offsets,
            size,
        })
    }
}

/// Assignment state for one signature: the next free argument register and the
/// next free incoming stack offset.
#[derive(Debug)]
pub struct ConventionState<'a> {
    convention: &'a CallingConvention,
    function: &'a str,
    next_reg: usize,
    registers_closed: bool,
    stack_offset: u32,
    next_index: u32,
}

impl<'a> ConventionState<'a> {
    /// Bytes of incoming stack used so far.
    pub fn stack_offset(&self) -> u32 {
        self.stack_offset
    }

    pub fn registers_left(&self) -> usize {
        if self.registers_closed {
            0
        } else {
            self.convention.arg_registers.len() - self.next_reg
        }
    }

    /// Takes the first argument register for a hidden pointer. Must be called
    /// before any parameter is assigned.
    pub fn reserve_pointer(&mut self) -> Option<PhysReg> {
        assert_eq!(self.next_index, 0, "hidden pointer reserved after parameters of `{}`", self.function);
        self.take_register()
    }

    fn take_register(&mut self) -> Option<PhysReg> {
        if self.registers_left() == 0 {
            return None;
        }
        let reg = self.convention.arg_registers[self.next_reg];
        self.next_reg += 1;
        Some(reg)
    }

    fn take_stack(&mut self, kind: ValueKind) -> LocationDescriptor {
        let offset = self.stack_offset;
        self.stack_offset += WORD_BYTES;
        LocationDescriptor::Stack { offset, kind }
    }

    fn take_word(&mut self, kind: ValueKind, stack_only: bool) -> LocationDescriptor {
        let reg = if stack_only { None } else { self.take_register() };
        match reg {
            Some(reg) => LocationDescriptor::Register { class: RegClass::Gpr, reg, kind },
            None => self.take_stack(kind),
        }
    }

    /// Assigns the location of parameter `index`. Parameters must be assigned in
    /// increasing index order, each exactly once.
    pub fn assign(&mut self, index: u32, kind: ValueKind, is_variadic: bool) -> Result<ArgLocation, LoweringError> {
        assert_eq!(
            index, self.next_index,
            "parameters of `{}` assigned out of order",
            self.function
        );
        self.next_index += 1;

        let passing = passing(kind)
            .ok_or_else(|| LoweringError::convention_gap(self.function, ValuePosition::Parameter(index), kind))?;
        let stack_only = is_variadic && self.convention.variadic == VariadicPolicy::Stack;

        let location = match passing {
            Passing::Word(loc_kind) => ArgLocation::Direct { value: kind, loc: self.take_word(loc_kind, stack_only) },
            Passing::Pair => {
                if !stack_only && self.registers_left() == 1 && self.convention.wide_values == WidePolicy::NoSplit {
                    self.registers_closed = true;
                }
                let stack_only = stack_only || self.registers_left() == 0;
                let lo = self.take_word(ValueKind::I32, stack_only);
                let hi = self.take_word(ValueKind::I32, stack_only);
                ArgLocation::Split { value: kind, lo, hi }
            }
        };
        log::trace!("{}: parameter {} ({}) -> {:?}", self.function, index, kind, location);
        Ok(location)
    }
}
