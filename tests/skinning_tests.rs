mod support;

use meshbuilder::{
    Influence, LayerKind, MeshBuilder, MeshBuilderConfig, MeshBuilderError, SkinningInfo,
    float_types::Real,
};
use nalgebra::Point3;

use crate::support::{approx_eq, init_logging};

/// Skinning where every vertex is fully bound to one joint.
fn single_joint_skin(joints: &[usize]) -> SkinningInfo {
    let mut skinning = SkinningInfo::new(joints.len());
    for (org_vertex, &joint) in joints.iter().enumerate() {
        skinning
            .add_influence(org_vertex, Influence::new(joint, 1.0))
            .expect("vertex exists");
    }
    skinning
}

fn submit(builder: &mut MeshBuilder, corners: &[usize]) -> Result<usize, MeshBuilderError> {
    builder.begin_polygon(0)?;
    for &org_vertex in corners {
        builder.add_polygon_vertex(org_vertex)?;
    }
    builder.end_polygon()
}

fn skinned_builder(joints: &[usize], max_bones: usize) -> MeshBuilder {
    let config = MeshBuilderConfig::new().with_max_bones_per_sub_mesh(max_bones);
    let mut builder = MeshBuilder::with_config(joints.len(), config);
    builder
        .set_skinning_info(single_joint_skin(joints))
        .expect("vertex counts match");
    builder
}

#[test]
fn polygons_follow_shared_joints() {
    init_logging();
    //            v0 v1 v2 v3 v4 v5 v6 v7 v8 v9 v10
    let joints = [0, 1, 2, 3, 4, 5, 3, 6, 0, 7, 1];
    let mut builder = skinned_builder(&joints, 4);

    // joints {0, 1, 2}
    assert_eq!(submit(&mut builder, &[0, 1, 2]), Ok(0));
    // joints {3, 4, 5} do not fit next to {0, 1, 2}
    assert_eq!(submit(&mut builder, &[3, 4, 5]), Ok(1));
    // joints {3, 4} are all in submesh 1
    assert_eq!(submit(&mut builder, &[3, 4, 6]), Ok(1));
    // joints {0, 6} share joint 0 with submesh 0, which still has room for one more joint
    assert_eq!(submit(&mut builder, &[0, 7, 8]), Ok(0));
    // joints {1, 7} share joint 1 with the now full submesh 0, and do not fit submesh 1
    assert_eq!(submit(&mut builder, &[1, 9, 10]), Ok(2));

    assert_eq!(builder.sub_mesh(0).expect("exists").joints(), &[0, 1, 2, 6]);
    assert_eq!(builder.sub_mesh(1).expect("exists").joints(), &[3, 4, 5]);
    assert_eq!(builder.sub_mesh(2).expect("exists").joints(), &[1, 7]);
    for sub_mesh in builder.sub_meshes() {
        assert!(sub_mesh.num_joints() <= 4);
    }
}

#[test]
fn most_shared_joints_wins_over_creation_order() {
    //            v0 v1 v2 v3 v4 v5 v6
    let joints = [0, 1, 2, 3, 4, 1, 3];
    let mut builder = skinned_builder(&joints, 3);

    assert_eq!(submit(&mut builder, &[0, 1, 2]), Ok(0));
    assert_eq!(submit(&mut builder, &[3, 4, 3]), Ok(1));
    // joints {1, 3}: one shared with each submesh. Submesh 0 is tried first but has no room
    // for joint 3, so submesh 1 takes it.
    assert_eq!(submit(&mut builder, &[5, 6, 6]), Ok(1));
    assert_eq!(builder.sub_mesh(1).expect("exists").joints(), &[3, 4, 1]);
}

#[test]
fn unskinned_polygons_fill_the_first_submesh() {
    let mut builder = MeshBuilder::new(6);
    assert_eq!(submit(&mut builder, &[0, 1, 2]), Ok(0));
    assert_eq!(submit(&mut builder, &[3, 4, 5]), Ok(0));
    assert_eq!(builder.sub_mesh(0).expect("exists").num_joints(), 0);
}

#[test]
fn polygon_with_too_many_joints_is_an_error() {
    let joints = [0, 1, 2, 3];
    let mut builder = skinned_builder(&joints, 2);
    assert_eq!(
        submit(&mut builder, &[0, 1, 2]),
        Err(MeshBuilderError::PolygonExceedsLimits {
            num_vertices: 3,
            num_joints: 3,
            max_vertices: 65535,
            max_bones: 2,
        })
    );
    assert_eq!(builder.num_sub_meshes(), 0);
}

#[test]
fn skinning_must_match_and_come_first() {
    let mut builder = MeshBuilder::new(3);
    assert_eq!(
        builder.set_skinning_info(SkinningInfo::new(2)),
        Err(MeshBuilderError::SkinningVertexCountMismatch {
            expected: 3,
            actual: 2
        })
    );
    submit(&mut builder, &[0, 1, 2]).expect("valid triangle");
    assert_eq!(
        builder.set_skinning_info(SkinningInfo::new(3)),
        Err(MeshBuilderError::SubmissionStarted)
    );
    assert!(builder.skinning_info().is_none());
}

#[test]
fn influences_use_the_submesh_bone_palette() {
    let joints = [0, 1, 2, 3, 4, 5, 3, 6, 0, 7, 1];
    let mut builder = skinned_builder(&joints, 4);
    let positions = builder
        .add_layer::<Point3<Real>>("position", LayerKind::Position)
        .expect("no polygons yet");

    for corners in [[0, 1, 2], [3, 4, 5], [3, 4, 6], [0, 7, 8], [1, 9, 10]] {
        builder.begin_polygon(0).expect("idle");
        for org_vertex in corners {
            builder
                .set_current_vertex_value(positions, Point3::new(org_vertex as Real, 0.0, 0.0))
                .expect("layer exists");
            builder.add_polygon_vertex(org_vertex).expect("in range");
        }
        builder.end_polygon().expect("fits");
    }
    builder.generate_sub_mesh_vertex_orders().expect("idle");

    // submesh 2 holds v1 (joint 1), v9 (joint 7) and v10 (joint 1)
    let influences = builder.sub_mesh_influences(2).expect("order generated");
    assert_eq!(
        influences,
        vec![
            vec![Influence::new(0, 1.0)],
            vec![Influence::new(1, 1.0)],
            vec![Influence::new(0, 1.0)],
        ]
    );
    let sub_mesh = builder.sub_mesh(2).expect("exists");
    assert_eq!(sub_mesh.joint(1), Some(7));
    assert_eq!(sub_mesh.local_joint_index(1), Some(0));
}

#[test]
fn optimize_is_idempotent() {
    let mut skinning = SkinningInfo::new(4);
    let weights: [&[(usize, Real)]; 4] = [
        &[(0, 0.4), (1, 0.3), (2, 0.2), (3, 0.05), (4, 0.05)],
        &[(5, 0.02), (6, 0.01)],
        &[(7, 0.25), (8, 0.5), (9, 0.25)],
        &[(10, 0.6), (11, 0.6), (12, 0.06)],
    ];
    for (org_vertex, influences) in weights.iter().enumerate() {
        for &(joint, weight) in influences.iter() {
            skinning
                .add_influence(org_vertex, Influence::new(joint, weight))
                .expect("vertex exists");
        }
    }

    skinning.optimize(4, 0.1);
    let once = skinning.clone();
    skinning.optimize(4, 0.1);

    for org_vertex in 0..4 {
        let a = once.influences(org_vertex);
        let b = skinning.influences(org_vertex);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.joint, y.joint);
            assert!(approx_eq(x.weight, y.weight, 1e-6));
        }

        assert!(!a.is_empty() && a.len() <= 4);
        assert!(approx_eq(once.calc_total_weight(org_vertex), 1.0, 1e-4));
        assert!(a.windows(2).all(|w| w[0].weight >= w[1].weight));
    }

    let first: Vec<usize> = once.influences(0).iter().map(|i| i.joint).collect();
    assert_eq!(first, vec![0, 1, 2]);
    // 0.02 and 0.01 normalize to 2/3 and 1/3, both above the threshold
    assert_eq!(once.influences(1)[0].joint, 5);
    assert_eq!(once.num_influences(1), 2);
    assert_eq!(once.influences(2)[0].joint, 8);
    // weights adding up to more than one lose the influence that is light once normalized
    let heavy: Vec<usize> = once.influences(3).iter().map(|i| i.joint).collect();
    assert_eq!(heavy, vec![10, 11]);
    assert_eq!(once.max_num_influences(), 3);
}
