use std::sync::Arc;

use elif_inject::{Initializer, Reflect, Typed};

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}
elif_inject::interface!(Clock);

#[derive(Default, Reflect)]
#[reflect(provides(Clock))]
struct FixedClock {
    at: u64,
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.at
    }
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct Scheduler {
    clock: Option<Arc<dyn Clock>>,
    started_at: u64,
}

impl Initializer for Scheduler {
    type Params = (Arc<dyn Clock>,);

    fn init(&mut self, (clock,): Self::Params) {
        self.started_at = clock.now();
        self.clock = Some(clock);
    }
}

#[derive(Reflect)]
#[reflect(no_default)]
struct Handle {
    id: u32,
}

fn main() {
    assert!(<Scheduler as Typed>::type_info().init.is_some());
    assert!(<FixedClock as Typed>::type_info().provided("Clock").is_some());
    assert!(<Handle as Typed>::type_info().construct.is_none());

    let handle = Handle { id: 1 };
    let _ = handle.id;
}
