use strum::{Display, EnumIter, EnumString};

/// How a container arranges its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DockKind {
    #[default]
    None,
    Tabs,
    Vertical,
    Horizontal,
}

/// Where new content should land relative to a reference node.
///
/// Three tiers plus two specials: view-tier splits immediately around the
/// reference, parent-tier around the nearest ancestor of the matching
/// orientation, root-tier around the window's whole content area. `Tabs`
/// inserts into a tab stack; `None` means a brand-new floating window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter)]
pub enum DropLocation {
    ViewLeft,
    ViewRight,
    ViewTop,
    ViewBottom,
    ParentLeft,
    ParentRight,
    ParentTop,
    ParentBottom,
    RootLeft,
    RootRight,
    RootTop,
    RootBottom,
    Tabs,
    None,
}

impl DropLocation {
    /// Container type a drop of this kind must land in.
    pub fn dock_kind(self) -> DockKind {
        match self {
            Self::ViewTop
            | Self::ViewBottom
            | Self::ParentTop
            | Self::ParentBottom
            | Self::RootTop
            | Self::RootBottom => DockKind::Vertical,
            Self::ViewLeft
            | Self::ViewRight
            | Self::ParentLeft
            | Self::ParentRight
            | Self::RootLeft
            | Self::RootRight => DockKind::Horizontal,
            Self::Tabs => DockKind::Tabs,
            Self::None => DockKind::None,
        }
    }

    pub fn is_view_tier(self) -> bool {
        matches!(self, Self::ViewLeft | Self::ViewRight | Self::ViewTop | Self::ViewBottom)
    }

    pub fn is_parent_tier(self) -> bool {
        matches!(
            self,
            Self::ParentLeft | Self::ParentRight | Self::ParentTop | Self::ParentBottom
        )
    }

    pub fn is_root_tier(self) -> bool {
        matches!(self, Self::RootLeft | Self::RootRight | Self::RootTop | Self::RootBottom)
    }

    /// Top/Left drops land before the reference, Bottom/Right after.
    pub fn inserts_before(self) -> bool {
        matches!(
            self,
            Self::ViewLeft
                | Self::ViewTop
                | Self::ParentLeft
                | Self::ParentTop
                | Self::RootLeft
                | Self::RootTop
        )
    }

    /// Offset from the reference's own index when inserting a sibling.
    pub fn sibling_offset(self) -> usize {
        if self.inserts_before() { 0 } else { 1 }
    }

    /// Index for insertion straight into a container: front or append.
    pub fn container_index(self) -> Option<usize> {
        if self.inserts_before() { Some(0) } else { Option::None }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ViewLeft => "View Left",
            Self::ViewRight => "View Right",
            Self::ViewTop => "View Top",
            Self::ViewBottom => "View Bottom",
            Self::ParentLeft => "Parent Left",
            Self::ParentRight => "Parent Right",
            Self::ParentTop => "Parent Top",
            Self::ParentBottom => "Parent Bottom",
            Self::RootLeft => "Window Left",
            Self::RootRight => "Window Right",
            Self::RootTop => "Window Top",
            Self::RootBottom => "Window Bottom",
            Self::Tabs => "Tabs",
            Self::None => "Window",
        }
    }
}
