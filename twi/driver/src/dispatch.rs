//! Completion dispatch
//!
//! Synchronous callers spin on [`TransferEngine::poll`]; instances with a
//! handler are driven by [`Twi::on_interrupt`], which finishes the control
//! block bookkeeping, launches the linked transfer and reports the outcome.

use embedded_hal::delay::DelayNs;
use twi_core::{EventKind, TransferDescriptor, TransferEvent, TwiError, TwiResult, XferFlags};
use twi_hal::{GpioPin, InterruptLine};

use crate::engine::{Service, TransferEngine};
use crate::twi::{InterruptMask, Twi};

impl<'d, E, P, D, I> Twi<'d, E, P, D, I>
where
    E: TransferEngine,
    P: GpioPin,
    D: DelayNs,
    I: InterruptLine,
{
    /// Spins until `descriptor` reaches its terminal event.
    ///
    /// There is no timeout: a bus held low by a device hangs here.
    pub(crate) fn complete_blocking(&self, descriptor: &mut TransferDescriptor<'_>) -> TwiResult<()> {
        let result = nb::block!(self.engine.poll(&self.control, descriptor));

        self.control.with(|cb| {
            cb.busy = false;
            cb.active = None;
        });

        result.map_err(|err| {
            debug!("twi: transfer failed: {:?}", err);
            TwiError::InternalError
        })
    }

    /// Interrupt entry point for this instance.
    ///
    /// Call it from the peripheral's interrupt handler. Does nothing when no
    /// handler is registered.
    pub fn on_interrupt(&self) {
        let step = self.control.with(|cb| {
            let handler = cb.handler?;
            let Service::Complete(done) = self.engine.service(cb) else {
                return None;
            };

            let repeated = cb.repeated;
            if !repeated {
                cb.busy = false;
            }
            let notify = !(cb.flags.contains(XferFlags::NO_COMPLETION_SIGNAL) && done.kind.is_done());
            let descriptor = cb.active.take();
            let linked = if repeated { None } else { cb.linked.pop_front() };
            Some((handler, done, descriptor, linked, repeated, notify))
        });

        let Some((handler, done, descriptor, linked, repeated, notify)) = step else {
            return;
        };
        trace!("twi: transfer complete: {:?}", done.kind);

        // The linked transfer goes on the wire before the handler runs, so a
        // transfer submitted from the handler queues behind it.
        let dropped = linked.and_then(|(next, flags)| {
            debug!("twi: starting linked transfer");
            let _mask = InterruptMask::new(&self.engine, &self.control, true);
            self.control.with(|cb| self.launch(cb, next, flags).err())
        });

        if let Some(descriptor) = descriptor {
            if notify {
                let event = TransferEvent {
                    kind: done.kind,
                    descriptor: descriptor.snapshot(done.primary_len, done.secondary_len),
                };
                handler.on_event(&event);
            }

            if repeated {
                self.control.with(|cb| {
                    if cb.active.is_none() {
                        cb.active = Some(descriptor);
                    }
                });
            }
        }

        // Its submitter was told the request was accepted.
        if let Some((err, next)) = dropped {
            warn!("twi: linked transfer failed to start: {:?}", err);
            handler.on_event(&TransferEvent {
                kind: EventKind::InternalError,
                descriptor: next.snapshot(0, 0),
            });
        }
    }
}
