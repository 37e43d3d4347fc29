// Network coordinate models

use serde::{Deserialize, Serialize};

/// Vivaldi network coordinate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Coord {
    pub vec: Vec<f64>,
    pub error: f64,
    pub adjustment: f64,
    pub height: f64,
}

impl Coord {
    /// Estimated round trip time to `other`, in seconds
    pub fn distance_to(&self, other: &Coord) -> f64 {
        let euclidean = self
            .vec
            .iter()
            .zip(&other.vec)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        let rtt = euclidean + self.height + other.height;
        let adjusted = rtt + self.adjustment + other.adjustment;
        if adjusted > 0.0 { adjusted } else { rtt }
    }
}

/// Coordinate of one node (LAN) or server (WAN)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoordinateEntry {
    pub node: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub segment: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition: String,
    pub coord: Coord,
}

/// WAN coordinates of the servers of one datacenter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoordinateDatacenterMap {
    pub datacenter: String,
    #[serde(rename = "AreaID", default)]
    pub area_id: String,
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub coordinates: Vec<CoordinateEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coord {
            vec: vec![0.001, 0.0],
            error: 0.2,
            adjustment: 0.0,
            height: 0.0001,
        };
        let b = Coord {
            vec: vec![0.0, 0.0],
            error: 0.2,
            adjustment: 0.0,
            height: 0.0001,
        };
        let d = a.distance_to(&b);
        assert!((d - 0.0012).abs() < 1e-9);
        assert_eq!(d, b.distance_to(&a));
    }

    #[test]
    fn test_datacenter_map_deserialize() {
        let json = r#"[{
            "Datacenter": "dc1", "AreaID": "WAN",
            "Coordinates": [{"Node": "agent-one", "Segment": "",
                "Coord": {"Adjustment": 0, "Error": 1.5, "Height": 0, "Vec": [0,0,0,0,0,0,0,0]}}]
        }]"#;
        let maps: Vec<CoordinateDatacenterMap> = serde_json::from_str(json).unwrap();
        assert_eq!(maps[0].coordinates[0].coord.vec.len(), 8);
    }
}
