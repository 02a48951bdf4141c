/// Fixed pair of equally-sized surfaces alternating between read and write roles.
///
/// Roles are an index flip; surfaces never move, so a swap is O(1) and any
/// handle derived from a surface (bind groups, views) stays valid until the
/// next [`PingPong::reallocate`].
#[derive(Debug)]
pub struct PingPong<S> {
    surfaces: [S; 2],
    read_index: usize,
    generation: u64,
}

impl<S> PingPong<S> {
    pub fn new(mut allocate: impl FnMut(usize) -> S) -> Self {
        Self {
            surfaces: [allocate(0), allocate(1)],
            read_index: 0,
            generation: 0,
        }
    }

    /// Surface holding the latest completed step.
    pub fn read(&self) -> &S {
        &self.surfaces[self.read_index]
    }

    /// Surface the next step writes into.
    pub fn write(&self) -> &S {
        &self.surfaces[1 - self.read_index]
    }

    pub fn read_mut(&mut self) -> &mut S {
        &mut self.surfaces[self.read_index]
    }

    /// Borrows both roles at once; the write surface is the only mutable one.
    pub fn pair(&mut self) -> (&S, &mut S) {
        let [first, second] = &mut self.surfaces;
        if self.read_index == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        }
    }

    pub fn swap(&mut self) {
        self.read_index = 1 - self.read_index;
    }

    /// Index of the surface currently in the read role.
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Bumped by every reallocation. Only reported in logs; stale frames are
    /// rejected through their [`crate::FrameToken`] instead.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces both surfaces and restores the initial role assignment.
    pub fn reallocate(&mut self, mut allocate: impl FnMut(usize) -> S) {
        self.surfaces = [allocate(0), allocate(1)];
        self.read_index = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn surfaces(&self) -> &[S; 2] {
        &self.surfaces
    }

    pub fn into_surfaces(self) -> [S; 2] {
        self.surfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::WaveField;

    #[test]
    fn swap_exchanges_roles_without_copying() {
        let mut store = PingPong::new(|_| WaveField::new(4, 4));
        let read_before = store.read() as *const WaveField;
        let write_before = store.write() as *const WaveField;

        store.swap();

        assert!(std::ptr::eq(store.read(), write_before));
        assert!(std::ptr::eq(store.write(), read_before));
    }

    #[test]
    fn pair_hands_out_distinct_surfaces() {
        let mut store = PingPong::new(|index| {
            let mut field = WaveField::new(2, 2);
            field.set_pressure(0, 0, index as f32);
            field
        });
        store.swap();
        let (read, write) = store.pair();
        assert_eq!(read.pressure(0, 0), 1.0);
        write.set_pressure(0, 0, 7.0);
        assert_eq!(store.read().pressure(0, 0), 1.0);
        assert_eq!(store.write().pressure(0, 0), 7.0);
    }

    #[test]
    fn reallocate_bumps_generation_and_resets_roles() {
        let mut store = PingPong::new(|_| WaveField::new(4, 4));
        store.swap();
        store.reallocate(|_| WaveField::new(8, 2));
        assert_eq!(store.generation(), 1);
        assert_eq!(store.read_index(), 0);
        assert_eq!(store.read().dimensions(), (8, 2));
        assert!(store.read().is_zero() && store.write().is_zero());
    }
}
