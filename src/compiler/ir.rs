//! Intermediate representation.
//!
//! A function body is an [`IrGraph`]: basic blocks holding typed
//! instructions, each block closed by exactly one [`Terminator`]. Values are
//! referred to by [`ValueTag`]s, assigned once when the producing
//! instruction is appended. A sealed block never takes another instruction.

use std::fmt::Display;

use thiserror::Error;

use crate::type_checker::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueTag(pub usize);

impl Display for ValueTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("block {block} is already sealed")]
    BlockSealed { block: BlockId },
    #[error("block {block} does not exist")]
    UnknownBlock { block: BlockId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Char(char),
    String(String),
    None,
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{}", value),
            Constant::UInt(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{:?}", value),
            Constant::Bool(value) => write!(f, "{}", value),
            Constant::Char(value) => write!(f, "{:?}", value),
            Constant::String(value) => write!(f, "{:?}", value),
            Constant::None => write!(f, "none"),
        }
    }
}

/// Something that can be loaded from, stored to or have its address taken.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Local(usize),
    Argument(usize),
    /// `object` is `None` for static fields.
    Field {
        object: Option<ValueTag>,
        owner: String,
        name: String,
    },
    Indirect(ValueTag),
}

impl Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Place::Local(slot) => write!(f, "local{}", slot),
            Place::Argument(index) => write!(f, "arg{}", index),
            Place::Field {
                object: Some(object),
                owner,
                name,
            } => write!(f, "{}.{}::{}", object, owner, name),
            Place::Field { object: None, owner, name } => write!(f, "{}::{}", owner, name),
            Place::Indirect(pointer) => write!(f, "*{}", pointer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// `print` / `println`.
    Builtin(String),
    /// A user function, method or operator overload.
    Function { owner: String, name: String },
    /// Runtime helpers such as string concatenation.
    Intrinsic(String),
}

impl Display for Callee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callee::Builtin(name) => write!(f, "builtin {}", name),
            Callee::Function { owner, name } => write!(f, "{}::{}", owner, name),
            Callee::Intrinsic(name) => write!(f, "intrinsic {}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    Constant(Constant),
    Load(Place),
    Store { place: Place, value: ValueTag },
    AddressOf(Place),
    LoadSelf,
    /// Builtin binary operator, tagged with its spelling.
    Binary {
        operator: String,
        left: ValueTag,
        right: ValueTag,
    },
    Unary {
        operator: String,
        operand: ValueTag,
    },
    Call {
        callee: Callee,
        receiver: Option<ValueTag>,
        arguments: Vec<ValueTag>,
    },
    NewTuple(Vec<ValueTag>),
    NewArray(Vec<ValueTag>),
    Default,
}

impl InstructionKind {
    pub fn is_store(&self) -> bool {
        matches!(self, InstructionKind::Store { .. })
    }
}

fn tags(values: &[ValueTag]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<String>>().join(", ")
}

impl Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionKind::Constant(constant) => write!(f, "const {}", constant),
            InstructionKind::Load(place) => write!(f, "load {}", place),
            InstructionKind::Store { place, value } => write!(f, "store {}, {}", place, value),
            InstructionKind::AddressOf(place) => write!(f, "addr {}", place),
            InstructionKind::LoadSelf => write!(f, "self"),
            InstructionKind::Binary { operator, left, right } => write!(f, "{} {}, {}", operator, left, right),
            InstructionKind::Unary { operator, operand } => write!(f, "{} {}", operator, operand),
            InstructionKind::Call {
                callee,
                receiver,
                arguments,
            } => match receiver {
                Some(receiver) => write!(f, "call {} on {} ({})", callee, receiver, tags(arguments)),
                None => write!(f, "call {} ({})", callee, tags(arguments)),
            },
            InstructionKind::NewTuple(elements) => write!(f, "tuple ({})", tags(elements)),
            InstructionKind::NewArray(elements) => write!(f, "array [{}]", tags(elements)),
            InstructionKind::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub result: Option<ValueTag>,
    /// Type of the result; for stores, the type of the stored value.
    pub ty: Type,
    pub kind: InstructionKind,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.result {
            Some(result) => write!(f, "{}: {} = {}", result, self.ty, self.kind),
            None => write!(f, "{} : {}", self.kind, self.ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Fallthrough into the next block.
    Jump(BlockId),
    Branch {
        condition: ValueTag,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Leaves the innermost loop.
    Break(BlockId),
    Return(Option<ValueTag>),
    Throw(ValueTag),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(target) | Terminator::Break(target) => vec![*target],
            Terminator::Branch {
                then_block, else_block, ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Throw(_) => vec![],
        }
    }
}

impl Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Jump(target) => write!(f, "jump {}", target),
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            } => write!(f, "branch {}, {}, {}", condition, then_block, else_block),
            Terminator::Break(target) => write!(f, "break {}", target),
            Terminator::Return(Some(value)) => write!(f, "return {}", value),
            Terminator::Return(None) => write!(f, "return"),
            Terminator::Throw(value) => write!(f, "throw {}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
    /// Created for statements that follow a terminator.
    pub unreachable: bool,
}

impl BasicBlock {
    pub fn is_sealed(&self) -> bool {
        self.terminator.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrGraph {
    blocks: Vec<BasicBlock>,
    next_value: usize,
}

impl Default for IrGraph {
    fn default() -> Self {
        IrGraph::new()
    }
}

impl IrGraph {
    /// Creates a graph with an empty entry block.
    pub fn new() -> Self {
        let mut graph = IrGraph {
            blocks: vec![],
            next_value: 0,
        };
        graph.new_block();
        graph
    }

    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock {
            id,
            instructions: vec![],
            terminator: None,
            unreachable: false,
        });
        id
    }

    pub fn new_unreachable_block(&mut self) -> BlockId {
        let id = self.new_block();
        self.blocks[id.0].unreachable = true;
        id
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.0)
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    fn open_block(&mut self, id: BlockId) -> Result<&mut BasicBlock, IrError> {
        let block = self.blocks.get_mut(id.0).ok_or(IrError::UnknownBlock { block: id })?;
        if block.is_sealed() {
            return Err(IrError::BlockSealed { block: id });
        }
        Ok(block)
    }

    pub fn is_sealed(&self, id: BlockId) -> bool {
        self.block(id).is_some_and(BasicBlock::is_sealed)
    }

    /// Appends an instruction to an open block.
    ///
    /// # Returns
    ///
    /// The new value tag, or `None` for stores and `none`-typed results.
    pub fn append(&mut self, id: BlockId, ty: Type, kind: InstructionKind) -> Result<Option<ValueTag>, IrError> {
        let produces_value = !kind.is_store() && !ty.is_void();
        let result = produces_value.then_some(ValueTag(self.next_value));

        self.open_block(id)?.instructions.push(Instruction { result, ty, kind });

        if produces_value {
            self.next_value += 1;
        }
        Ok(result)
    }

    pub fn seal(&mut self, id: BlockId, terminator: Terminator) -> Result<(), IrError> {
        self.open_block(id)?.terminator = Some(terminator);
        Ok(())
    }

    /// Closes every block still open with a plain return.
    pub fn seal_open_blocks(&mut self) {
        for block in self.blocks.iter_mut().filter(|b| !b.is_sealed()) {
            block.terminator = Some(Terminator::Return(None));
        }
    }

    /// Blocks reachable from the entry block, in depth-first order.
    pub fn reachable_blocks(&self) -> Vec<BlockId> {
        let mut seen = vec![false; self.blocks.len()];
        let mut stack = vec![self.entry()];
        let mut order = vec![];

        while let Some(id) = stack.pop() {
            match seen.get_mut(id.0) {
                Some(visited) if !*visited => *visited = true,
                _ => continue,
            }

            order.push(id);
            if let Some(terminator) = self.block(id).and_then(|b| b.terminator.as_ref()) {
                stack.extend(terminator.successors().into_iter().rev());
            }
        }
        order
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }
}

impl Display for IrGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for block in &self.blocks {
            if block.unreachable {
                writeln!(f, "{}: ; unreachable", block.id)?;
            } else {
                writeln!(f, "{}:", block.id)?;
            }

            for instruction in &block.instructions {
                writeln!(f, "    {}", instruction)?;
            }

            match &block.terminator {
                Some(terminator) => writeln!(f, "    {}", terminator)?,
                None => writeln!(f, "    <open>")?,
            }
        }
        Ok(())
    }
}
