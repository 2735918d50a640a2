pub const ACTIVITIES: &str = "activities";
pub const INTERACTIONS: &str = "interactions";
pub const META: &str = "meta";

// Secondary index trees
pub const ACTIVITY_FILTER_INDEX: &str = "activity_filter_index";
