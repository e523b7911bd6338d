#[cfg(all(test, feature = "cluster"))]
mod tests {
    use crate::cluster::{HierarchicalClustering, Kmeans, Linkage, Metric, PcaProjector};
    use crate::hierarchy::{
        validate_tree, ClusterNode, LinkageMatrix, LinkageTreeBuilder, PartitionConfig,
        PartitionalTreeBuilder, Strategy as Built,
    };
    use crate::render::InMemoryRenderer;
    use crate::serialize::TreeSerializer;
    use crate::Result;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn identifiers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("./example-data/images/{i:03}.jpg")).collect()
    }

    fn leaf_previews(root: &ClusterNode) -> Vec<String> {
        root.leaves().filter_map(|l| l.preview.clone()).collect()
    }

    /// Two well separated groups of four 64-bit hashes.
    fn hashes() -> Vec<Vec<f32>> {
        let mut rows = Vec::new();
        for group in 0..2 {
            for flip in 0..4 {
                let mut row = vec![group as f32; 64];
                row[flip] = 1.0 - row[flip];
                rows.push(row);
            }
        }
        rows
    }

    #[test]
    fn test_hamming_linkage_end_to_end() -> Result<()> {
        let features = hashes();
        let ids = identifiers(features.len());
        let z = HierarchicalClustering::new().fit_linkage(&features)?;
        assert_eq!(z.n_merges(), 7);

        let mut renderer = InMemoryRenderer::new("hamming-average");
        let root = LinkageTreeBuilder::new().build(&mut renderer, &z, &features, &ids)?;

        assert_eq!(root.size, Some(8));
        assert_eq!(root.children.len(), 2);
        let left: HashSet<_> = leaf_previews(&root.children[0]).into_iter().collect();
        let expected_a: HashSet<_> = ids[..4].iter().cloned().collect();
        let expected_b: HashSet<_> = ids[4..].iter().cloned().collect();
        assert!(left == expected_a || left == expected_b);

        // one render per merge, one synthetic name per render
        assert_eq!(renderer.records().len(), 7);
        assert!(validate_tree(&root, Built::Linkage).is_clean());
        Ok(())
    }

    #[test]
    fn test_kmeans_tree_end_to_end() -> Result<()> {
        let features = hashes();
        let ids = identifiers(features.len());
        let config = PartitionConfig::new()
            .with_branching_factor(2)
            .with_split_threshold(5);
        let builder = PartitionalTreeBuilder::new(config, Kmeans::new().with_seed(3))
            .with_projector(PcaProjector::new());

        let mut renderer = InMemoryRenderer::new("kmeans-centroid");
        let root = builder.build(&mut renderer, &features, &features, &ids)?;

        assert_eq!(root.size, Some(8));
        assert_eq!(root.children.len(), 2);
        for child in &root.children {
            assert_eq!(child.size, Some(4));
            assert_eq!(child.children.len(), 4);
            assert!(child.children.iter().all(ClusterNode::is_leaf));
            assert_eq!(child.x.as_ref().map(Vec::len), Some(2));
        }
        assert_eq!(root.x.as_ref().map(Vec::len), Some(1));

        let report = validate_tree(&root, Built::Partitional);
        assert!(report.is_clean(), "{report}");
        Ok(())
    }

    #[test]
    fn test_serialized_tree_matches_built_tree() -> Result<()> {
        let z = LinkageMatrix::from_rows(&[
            [0.0, 1.0, 0.1, 2.0],
            [2.0, 3.0, 0.2, 2.0],
            [4.0, 5.0, 0.9, 4.0],
        ])?;
        let images: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32]).collect();
        let ids = identifiers(4);
        let mut renderer = InMemoryRenderer::new("hamming-average");
        let root = LinkageTreeBuilder::new().build(&mut renderer, &z, &images, &ids)?;

        let ser = TreeSerializer::new();
        let text = ser.serialize(&root)?;
        let parsed = ser.parse(&text)?;

        let shape = |t: &ClusterNode| {
            t.iter()
                .map(|n| (n.name.clone(), n.size, n.children.len()))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&parsed), shape(&root));
        assert_eq!(ser.serialize(&parsed)?, text);
        Ok(())
    }

    #[test]
    fn test_chained_linkage_round_trips() -> Result<()> {
        // one merge per item onto the running cluster: nesting grows with n
        let n = 300;
        let mut z = LinkageMatrix::new(n);
        z.add_merge(0, 1, 0.0, 2);
        for item in 2..n {
            z.add_merge(n + item - 2, item, item as f64, item + 1);
        }
        let images: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32]).collect();
        let ids = identifiers(n);
        let mut renderer = InMemoryRenderer::new("hamming-average");
        let root = LinkageTreeBuilder::new().build(&mut renderer, &z, &images, &ids)?;
        assert_eq!(root.depth(), n - 1);

        for ser in [TreeSerializer::new(), TreeSerializer::new().compact(true)] {
            let text = ser.serialize(&root)?;
            let parsed = ser.parse(&text)?;
            assert_eq!(parsed.depth(), n - 1);
            assert_eq!(leaf_previews(&parsed), leaf_previews(&root));
            assert_eq!(parsed.size, Some(n));
            assert_eq!(ser.serialize(&parsed)?, text);
        }
        Ok(())
    }

    #[cfg(feature = "imaging")]
    #[test]
    fn test_jpeg_previews_written_per_cluster() -> Result<()> {
        use crate::render::JpegRenderer;
        use image::{Rgb, RgbImage};

        let dir = tempfile::tempdir()?;
        let images: Vec<RgbImage> = (0..4u8)
            .map(|i| RgbImage::from_pixel(4, 4, Rgb([i * 60, 0, 0])))
            .collect();
        let features = vec![vec![0.0], vec![0.1], vec![10.0], vec![10.1]];
        let ids = identifiers(4);

        let config = PartitionConfig::new()
            .with_branching_factor(2)
            .with_split_threshold(3);
        let builder = PartitionalTreeBuilder::new(config, Kmeans::new().with_seed(11));
        let mut renderer = JpegRenderer::new(dir.path(), "kmeans-centroid");
        let root = builder.build(&mut renderer, &features, &images, &ids)?;

        let previews: Vec<String> = root
            .iter()
            .filter(|n| !n.is_leaf())
            .filter_map(|n| n.preview.clone())
            .collect();
        assert_eq!(previews.len(), 3);
        for preview in &previews {
            assert!(std::path::Path::new(preview).is_file(), "{preview}");
        }
        assert!(previews[0].ends_with("kmeans-centroid-0.JPEG"));
        Ok(())
    }

    fn binary_rows(max_items: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
        (2..max_items).prop_flat_map(|n| {
            proptest::collection::vec(
                proptest::collection::vec(any::<bool>().prop_map(|b| b as u8 as f32), 16),
                n,
            )
        })
    }

    proptest! {
        #[test]
        fn linkage_tree_covers_every_item_once(
            rows in binary_rows(24),
            single in any::<bool>(),
        ) {
            let method = if single { Linkage::Single } else { Linkage::Complete };
            let z = HierarchicalClustering::new()
                .with_linkage(method)
                .with_metric(Metric::Hamming)
                .fit_linkage(&rows)
                .unwrap();
            let ids = identifiers(rows.len());
            let mut renderer = InMemoryRenderer::new("hamming-average");
            let root = LinkageTreeBuilder::new()
                .build(&mut renderer, &z, &rows, &ids)
                .unwrap();

            let mut previews = leaf_previews(&root);
            prop_assert_eq!(previews.len(), rows.len());
            previews.sort();
            prop_assert_eq!(previews, ids);
            prop_assert_eq!(root.size, Some(rows.len()));

            let report = validate_tree(&root, Built::Linkage);
            prop_assert!(report.is_clean(), "{}", report);
        }

        #[test]
        fn partitional_sizes_equal_leaf_counts(
            rows in proptest::collection::vec(
                proptest::collection::vec(-10.0f32..10.0, 3),
                1..40,
            ),
            k in 1usize..5,
            split_threshold in 1usize..8,
            max_depth in 0usize..4,
        ) {
            let config = PartitionConfig::new()
                .with_branching_factor(k)
                .with_split_threshold(split_threshold)
                .with_max_depth(max_depth);
            let builder = PartitionalTreeBuilder::new(config, Kmeans::new().with_seed(5));
            let ids = identifiers(rows.len());
            let mut renderer = InMemoryRenderer::new("kmeans-centroid");
            let root = builder.build(&mut renderer, &rows, &rows, &ids).unwrap();

            prop_assert_eq!(root.size, Some(rows.len()));
            for node in root.iter() {
                prop_assert_eq!(node.size, Some(node.leaf_count()));
            }
            let report = validate_tree(&root, Built::Partitional);
            prop_assert!(report.is_healthy(), "{}", report);
        }
    }
}
