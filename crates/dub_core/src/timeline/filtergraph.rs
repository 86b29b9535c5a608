//! Renders a video time plan as an ffmpeg filtergraph.
//!
//! Each region is independently trimmed from the source video and its
//! presentation timestamps scaled by `pts_factor`, then all regions
//! are concatenated in order. The muxing collaborator runs the graph;
//! this module only produces the string.

use super::plan::VideoTimePlan;

/// Output pad label of the rendered graph.
pub const OUTPUT_LABEL: &str = "vout";

/// Render the plan as a `filter_complex` expression on input `[0:v]`.
///
/// Returns `None` for a `Copy` plan (no filtering, stream copy) and for
/// an empty remap.
pub fn render_filtergraph(plan: &VideoTimePlan) -> Option<String> {
    let regions = plan.regions();
    if plan.is_copy() || regions.is_empty() {
        return None;
    }

    let mut graph = String::new();
    for (i, region) in regions.iter().enumerate() {
        graph.push_str(&format!(
            "[0:v]trim=start={:.6}:end={:.6},setpts=(PTS-STARTPTS)*{:.6}[v{}];",
            region.source_start, region.source_end, region.pts_factor, i
        ));
    }

    if regions.len() == 1 {
        // Single region: rename the pad instead of a 1-way concat.
        graph.truncate(graph.len() - "[v0];".len());
        graph.push_str(&format!("[{}]", OUTPUT_LABEL));
    } else {
        for i in 0..regions.len() {
            graph.push_str(&format!("[v{}]", i));
        }
        graph.push_str(&format!(
            "concat=n={}:v=1:a=0[{}]",
            regions.len(),
            OUTPUT_LABEL
        ));
    }

    Some(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionKind;
    use crate::timeline::plan::Region;

    #[test]
    fn copy_plan_renders_nothing() {
        assert_eq!(render_filtergraph(&VideoTimePlan::Copy), None);
    }

    #[test]
    fn single_region_has_no_concat() {
        let plan = VideoTimePlan::Remap {
            regions: vec![Region::new(0.0, 2.0, 1.25, RegionKind::Speech)],
        };
        let graph = render_filtergraph(&plan).unwrap();
        assert!(graph.contains("trim=start=0.000000:end=2.000000"));
        assert!(graph.contains("setpts=(PTS-STARTPTS)*1.250000"));
        assert!(graph.ends_with("[vout]"));
        assert!(!graph.contains("concat"));
    }

    #[test]
    fn multi_region_concatenates_in_order() {
        let plan = VideoTimePlan::Remap {
            regions: vec![
                Region::new(0.0, 2.0, 1.0, RegionKind::Gap),
                Region::new(2.0, 4.0, 1.43, RegionKind::Speech),
                Region::new(4.0, 10.0, 1.0, RegionKind::Tail),
            ],
        };
        let graph = render_filtergraph(&plan).unwrap();
        assert!(graph.contains("[v0];"));
        assert!(graph.contains("[v1];"));
        assert!(graph.contains("[v2];"));
        assert!(graph.contains("[v0][v1][v2]concat=n=3:v=1:a=0[vout]"));

        let trim0 = graph.find("trim=start=0.000000").unwrap();
        let trim1 = graph.find("trim=start=2.000000").unwrap();
        assert!(trim0 < trim1);
    }
}
