use std::cell::RefCell;

use crate::shape::Shape;

// -----------------------------------------------------------------------------
// ShapeReceiver

/// Per-thread scratch state that "receives" a closed container shape from a
/// [`TypeNode`](crate::info::TypeNode)'s monomorphized shape callback.
///
/// The receiver exists so that closing a generic shape never requires
/// runtime type-argument discovery: the callback was compiled with the
/// concrete type arguments bound and simply deposits the finished function
/// table here.
///
/// One receiver is reused across calls on the same thread to avoid per-call
/// allocation. It is **not** reentrant: a resolution must fully complete
/// before another starts on the same thread. Shape callbacks do not resolve
/// other shapes, so the resolver upholds this by construction; the
/// [`RefCell`] borrow turns any violation into an immediate panic rather
/// than silent corruption.
pub struct ShapeReceiver {
    slot: Option<Shape>,
}

impl ShapeReceiver {
    const fn new() -> Self {
        Self { slot: None }
    }

    /// Deposits the closed shape. Called by the node's shape callback.
    #[inline]
    pub fn accept(&mut self, shape: Shape) {
        self.slot = Some(shape);
    }

    #[inline]
    fn take(&mut self) -> Option<Shape> {
        self.slot.take()
    }
}

thread_local! {
    static RECEIVER: RefCell<ShapeReceiver> = const { RefCell::new(ShapeReceiver::new()) };
}

/// Runs a shape callback against this thread's receiver and returns the
/// shape it deposited.
///
/// # Panics
///
/// Panics if the callback deposits nothing, or if a resolution is already
/// outstanding on this thread.
pub(crate) fn receive_shape(getter: fn(&mut ShapeReceiver)) -> Shape {
    RECEIVER.with(|receiver| {
        let mut receiver = receiver.borrow_mut();
        getter(&mut receiver);
        receiver
            .take()
            .expect("shape callback did not deposit a shape")
    })
}
