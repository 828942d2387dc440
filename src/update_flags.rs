use bitflags::bitflags;

bitflags! {
    /// Pending change kinds raised by input aggregation and UI layout.
    ///
    /// Flags accumulate by set-union across every event observed since the
    /// last drain. The frame-update drain is the only code allowed to clear
    /// them, and it must clear each flag it handled within the same frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UpdateFlags: u8 {
        const STOP = 1 << 0;
        const RENDER = 1 << 1;
        const ZOOM = 1 << 2;
        const RESIZE = 1 << 3;
        const ORBIT = 1 << 4;
        const VIEWPORT_RESIZE = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accumulate_by_union() {
        let mut flags = UpdateFlags::empty();
        flags.insert(UpdateFlags::ORBIT);
        flags.insert(UpdateFlags::RESIZE);
        flags.insert(UpdateFlags::ORBIT);
        assert_eq!(flags, UpdateFlags::ORBIT | UpdateFlags::RESIZE);
    }

    #[test]
    fn remove_clears_only_handled_bits() {
        let mut flags = UpdateFlags::ORBIT | UpdateFlags::RESIZE | UpdateFlags::STOP;
        flags.remove(UpdateFlags::ORBIT);
        assert!(!flags.contains(UpdateFlags::ORBIT));
        assert!(flags.contains(UpdateFlags::RESIZE));
        assert!(flags.contains(UpdateFlags::STOP));
    }
}
