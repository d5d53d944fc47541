/*!
 * Test node kinds
 * Small AST-shaped kinds sharing nothing but arena-aware construction
 */

use hierarchical_arena::{AllocResult, Allocatable, Arena, Placed};
use std::cell::Cell;
use std::rc::Rc;

/// Identifier node: a name copied into the arena
pub struct Ident;

pub struct IdentNode<'a> {
    pub name: &'a str,
}

impl Allocatable for Ident {
    type Node<'arena> = IdentNode<'arena>;
    type Args = &'static str;

    fn construct<'arena>(arena: &'arena Arena, name: Self::Args) -> AllocResult<IdentNode<'arena>> {
        Ok(IdentNode {
            name: arena.duplicate_str(name)?,
        })
    }
}

/// Statement in an arena-resident singly linked list
pub struct Stmt<'a> {
    pub index: usize,
    pub next: Option<&'a Stmt<'a>>,
}

/// Program root: places its statements during construction
pub struct Program;

pub struct ProgramNode<'a> {
    pub name: &'a str,
    pub first: Option<&'a Stmt<'a>>,
    pub drops: Rc<Cell<u32>>,
}

impl ProgramNode<'_> {
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.first;
        while let Some(stmt) = cursor {
            count += 1;
            cursor = stmt.next;
        }
        count
    }
}

impl Drop for ProgramNode<'_> {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

pub struct ProgramArgs {
    pub name: &'static str,
    pub statements: usize,
    pub drops: Rc<Cell<u32>>,
}

impl Allocatable for Program {
    type Node<'arena> = ProgramNode<'arena>;
    type Args = ProgramArgs;

    fn construct<'arena>(arena: &'arena Arena, args: Self::Args) -> AllocResult<ProgramNode<'arena>> {
        let mut node = ProgramNode {
            name: arena.duplicate_str(args.name)?,
            first: None,
            drops: args.drops,
        };
        for index in 0..args.statements {
            push_stmt(&mut node, arena, index)?;
        }
        Ok(node)
    }
}

/// Prepend a statement allocated from `arena`
pub fn push_stmt<'a>(node: &mut ProgramNode<'a>, arena: &'a Arena, index: usize) -> AllocResult<()> {
    let stmt: &Stmt<'a> = arena.place(Stmt {
        index,
        next: node.first,
    })?;
    node.first = Some(stmt);
    Ok(())
}

/// Block holding a counted resource in each child
///
/// Children are kept as `Placed` handles, so their destructors run when
/// the block is dropped.
pub struct Block;

pub struct Guarded {
    pub drops: Rc<Cell<u32>>,
}

impl Drop for Guarded {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

pub struct GuardedKind;

impl Allocatable for GuardedKind {
    type Node<'arena> = Guarded;
    type Args = Rc<Cell<u32>>;

    fn construct<'arena>(_arena: &'arena Arena, drops: Self::Args) -> AllocResult<Guarded> {
        Ok(Guarded { drops })
    }
}

pub struct BlockNode<'a> {
    pub children: [Placed<'a, GuardedKind>; 3],
}

impl Allocatable for Block {
    type Node<'arena> = BlockNode<'arena>;
    type Args = Rc<Cell<u32>>;

    fn construct<'arena>(arena: &'arena Arena, drops: Self::Args) -> AllocResult<BlockNode<'arena>> {
        Ok(BlockNode {
            children: [
                Placed::new_in(arena, drops.clone())?,
                Placed::new_in(arena, drops.clone())?,
                Placed::new_in(arena, drops)?,
            ],
        })
    }
}

/// Kind whose construction asks for more than any test arena allows
pub struct Oversized;

impl Allocatable for Oversized {
    type Node<'arena> = &'arena [u8];
    type Args = usize;

    fn construct<'arena>(arena: &'arena Arena, size: Self::Args) -> AllocResult<&'arena [u8]> {
        let header = arena.allocate(16)?;
        header[0] = 0xAB;
        let body: &[u8] = arena.allocate(size)?;
        Ok(body)
    }
}

/// Module root whose children are placed into its own arena and handed over
///
/// The children become plain descendants; only the module's destructor
/// runs on teardown.
pub struct Module;

pub struct ModuleNode<'a> {
    pub children: [&'a Guarded; 3],
    pub drops: Rc<Cell<u32>>,
}

impl Drop for ModuleNode<'_> {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

pub struct ModuleArgs {
    pub drops: Rc<Cell<u32>>,
    pub child_drops: Rc<Cell<u32>>,
}

impl Allocatable for Module {
    type Node<'arena> = ModuleNode<'arena>;
    type Args = ModuleArgs;

    fn construct<'arena>(arena: &'arena Arena, args: Self::Args) -> AllocResult<ModuleNode<'arena>> {
        let child = || -> AllocResult<&'arena Guarded> {
            let placed = Placed::<GuardedKind>::new_in(arena, args.child_drops.clone())?;
            let resident: &'arena Guarded = placed.into_resident();
            Ok(resident)
        };

        Ok(ModuleNode {
            children: [child()?, child()?, child()?],
            drops: args.drops,
        })
    }
}
