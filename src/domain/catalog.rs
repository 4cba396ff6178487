//! Degree programmes offered by the portal, as (portal value, display label).

pub const DEGREES: &[(&str, &str)] = &[
    ("BTECH-CSE", "B.Tech - CSE"),
    ("BTECH-ECE", "B.Tech - ECE"),
    ("BTECH-EEE", "B.Tech - EEE"),
    ("BTECH-ME", "B.Tech - ME"),
    ("BTECH-CE", "B.Tech - CE"),
    ("BTECH-IEP-CSE", "B.Tech - IEP CSE"),
    ("BBA-BM", "BBA"),
    ("BCA-CAI", "BCA"),
    ("B.Com-BM", "B.Com"),
    ("B.Sc(Comp.)-CAI", "B.Sc (Computer)"),
    ("B.Sc.(Hons.)-AGRI", "B.Sc (Hons.) Agriculture"),
    ("MBA-BM", "MBA"),
    ("MCA-CSE", "MCA"),
    ("MSc-CSE", "M.Sc CSE"),
    ("M.Sc.-AGRI", "M.Sc Agriculture"),
    ("MTECH-CSE", "M.Tech - CSE"),
    ("MTECH-ECE", "M.Tech - ECE"),
    ("MTECH-EEE", "M.Tech - EEE"),
    ("MTECH-ME", "M.Tech - ME"),
    ("MTECH-CE", "M.Tech - CE"),
    ("PHD", "PhD"),
];

/// Display label for a portal degree value; falls back to the value itself.
pub fn degree_label(value: &str) -> &str {
    DEGREES
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
        .unwrap_or(value)
}
