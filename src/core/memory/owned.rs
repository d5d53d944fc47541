/*!
 * Self-Owned Allocation
 *
 * Arena-aware construction for object kinds that share no other structure:
 * - **Rooted**: the object creates and owns a private arena; dropping it
 *   frees the whole subtree allocated from that arena in one step
 * - **Placed**: the object lives in a caller-supplied arena it never frees
 *
 * # Destructors
 *
 * Only the root's destructor runs when a rooted tree is destroyed. Every
 * descendant allocated from its arena is reclaimed as raw memory. Kinds
 * whose descendants hold non-memory resources must keep those descendants
 * in [`Placed`] handles owned by the root, or release them in the root's
 * own `Drop`.
 */

use super::arena::Arena;
use crate::core::config::ArenaConfig;
use crate::core::errors::AllocResult;
use serde::{Deserialize, Serialize};
use std::alloc::Layout;
use std::any::type_name;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use tracing::{debug, trace};

/// Whether an arena-resident object is responsible for its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// The object created the arena and frees it on drop
    Owned,
    /// The arena belongs to someone else and outlives the object
    Borrowed,
}

/// Arena-aware construction, implemented once per object kind
///
/// The implementing type is a marker naming the kind; `Node<'arena>` is the
/// value as it exists inside an arena, free to hold `&'arena` references to
/// children allocated from that same arena.
///
/// # Example
///
/// ```
/// use hierarchical_arena::{AllocResult, Allocatable, Arena, Rooted};
///
/// struct Call;
///
/// struct CallNode<'a> {
///     callee: &'a str,
///     args: &'a [i64],
/// }
///
/// impl Allocatable for Call {
///     type Node<'arena> = CallNode<'arena>;
///     type Args = (&'static str, Vec<i64>);
///
///     fn construct<'arena>(
///         arena: &'arena Arena,
///         (callee, args): Self::Args,
///     ) -> AllocResult<CallNode<'arena>> {
///         Ok(CallNode {
///             callee: arena.duplicate_str(callee)?,
///             args: arena.place_slice(&args)?,
///         })
///     }
/// }
///
/// let call = Rooted::<Call>::new(("print", vec![1, 2])).unwrap();
/// assert_eq!(call.with(|node| node.args.len()), 2);
/// // Dropping `call` frees the node, the callee copy and the args together
/// ```
pub trait Allocatable {
    /// The object as stored in an arena living for `'arena`
    type Node<'arena>: 'arena;

    /// Constructor arguments
    type Args;

    /// Build the node, allocating any children from `arena`
    fn construct<'arena>(arena: &'arena Arena, args: Self::Args)
        -> AllocResult<Self::Node<'arena>>;
}

/// Diagnostics surface shared by rooted and placed objects
pub trait ArenaResident {
    /// Arena the object lives in
    fn arena(&self) -> &Arena;

    fn ownership(&self) -> Ownership;

    /// Check if destroying the object destroys its arena
    #[inline]
    fn owns_arena(&self) -> bool {
        self.ownership() == Ownership::Owned
    }
}

/// Heap-pinned arena freed on drop
///
/// Held as a raw pointer so the root's `&Arena` references stay valid when
/// the owning [`Rooted`] moves.
struct OwnedArena(NonNull<Arena>);

impl OwnedArena {
    fn new(arena: Arena) -> Self {
        Self(NonNull::from(Box::leak(Box::new(arena))))
    }

    #[inline]
    fn get(&self) -> &Arena {
        // SAFETY: the pointer came from `Box::leak` and is only freed in `drop`.
        unsafe { self.0.as_ref() }
    }
}

impl Drop for OwnedArena {
    fn drop(&mut self) {
        // SAFETY: reclaims the box leaked in `new`, exactly once.
        drop(unsafe { Box::from_raw(self.0.as_ptr()) });
    }
}

/// Freestanding object owning a private arena
///
/// The arena starts just large enough for the root and grows through the
/// root's own sub-allocations. Dropping the handle runs the root's
/// destructor, then frees the arena with every descendant in it.
///
/// Access goes through closures generic over the arena lifetime, so no
/// reference that dies before the arena can be stored in the tree.
///
/// # Threading
///
/// Neither `Send` nor `Sync`.
pub struct Rooted<K: Allocatable> {
    root: NonNull<K::Node<'static>>,
    arena: OwnedArena,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Allocatable> Rooted<K> {
    /// Construct a root in a fresh private arena
    pub fn new(args: K::Args) -> AllocResult<Self> {
        Self::with_config(ArenaConfig::default(), args)
    }

    /// Construct a root in a fresh private arena
    ///
    /// Only the initial capacity of `config` is overridden; its ledger and
    /// allocation limit apply to the private arena. If arena creation or
    /// construction fails, the arena is freed before the error returns.
    pub fn with_config(config: ArenaConfig, args: K::Args) -> AllocResult<Self> {
        let layout = Layout::new::<K::Node<'static>>();
        let arena = OwnedArena::new(Arena::with_config(config.sized_for(layout))?);

        let slot = arena.get().allocate_layout(layout)?;
        let node = K::construct(arena.get(), args)?;

        // SAFETY: `slot` has the layout of `K::Node`, which does not depend on
        // the lifetime argument, and lives in the heap-pinned arena.
        let root = unsafe {
            ptr::write(slot.as_ptr().cast(), node);
            slot.cast::<K::Node<'static>>()
        };

        debug!(
            kind = type_name::<K>(),
            reserved = arena.get().reserved_bytes(),
            "rooted object constructed"
        );

        Ok(Self {
            root,
            arena,
            _kind: PhantomData,
        })
    }

    /// Read the root
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: for<'a> FnOnce(&'a K::Node<'a>) -> R,
    {
        // SAFETY: the root is initialized until drop. `f` is generic over
        // `'a`, so its result cannot borrow the tree.
        let node = unsafe { self.root.cast::<K::Node<'_>>().as_ref() };
        f(node)
    }

    /// Mutate the root, with its arena available for new children
    pub fn with_mut<R, F>(&mut self, f: F) -> R
    where
        F: for<'a> FnOnce(&'a mut K::Node<'a>, &'a Arena) -> R,
    {
        // SAFETY: as in `with`; `&mut self` makes the access unique.
        let node = unsafe { self.root.cast::<K::Node<'_>>().as_mut() };
        f(node, self.arena.get())
    }

    /// Destroy the root and its whole arena
    pub fn destroy(self) {
        drop(self);
    }
}

impl<K: Allocatable> ArenaResident for Rooted<K> {
    #[inline]
    fn arena(&self) -> &Arena {
        self.arena.get()
    }

    #[inline]
    fn ownership(&self) -> Ownership {
        Ownership::Owned
    }
}

impl<K: Allocatable> Drop for Rooted<K> {
    fn drop(&mut self) {
        let reserved = self.arena.get().reserved_bytes();

        // SAFETY: the root is initialized and dropped exactly once, before
        // the `arena` field frees its storage.
        unsafe { ptr::drop_in_place(self.root.as_ptr()) };

        debug!(kind = type_name::<K>(), reserved, "rooted object destroyed");
    }
}

/// Object placed in an arena it does not own
///
/// Dropping the handle runs the node's destructor; its storage stays in
/// the arena until the arena is cleared or dropped.
pub struct Placed<'a, K: Allocatable> {
    node: bumpalo::boxed::Box<'a, K::Node<'a>>,
    arena: &'a Arena,
}

impl<'a, K: Allocatable> Placed<'a, K> {
    /// Construct a node inside `arena`
    ///
    /// Construction runs before storage is taken, so a failed construction
    /// leaves no placeholder behind.
    pub fn new_in(arena: &'a Arena, args: K::Args) -> AllocResult<Self> {
        let node = K::construct(arena, args)?;
        let slot = arena.place(node)?;

        trace!(kind = type_name::<K>(), "object placed");

        Ok(Self {
            // SAFETY: `slot` is initialized and uniquely referenced; the box
            // only drops the value and never frees arena memory.
            node: unsafe { bumpalo::boxed::Box::from_raw(slot) },
            arena,
        })
    }

    /// Hand the node over to the arena
    ///
    /// Its destructor will never run; it becomes a plain descendant.
    pub fn into_resident(self) -> &'a mut K::Node<'a> {
        bumpalo::boxed::Box::leak(self.node)
    }

    /// Run the node's destructor; the arena is untouched
    pub fn destroy(self) {
        drop(self);
    }
}

impl<'a, K: Allocatable> Deref for Placed<'a, K> {
    type Target = K::Node<'a>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<'a, K: Allocatable> DerefMut for Placed<'a, K> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.node
    }
}

impl<'a, K: Allocatable> ArenaResident for Placed<'a, K> {
    #[inline]
    fn arena(&self) -> &Arena {
        self.arena
    }

    #[inline]
    fn ownership(&self) -> Ownership {
        Ownership::Borrowed
    }
}
