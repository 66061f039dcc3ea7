use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use vista_ngin::{
    camera::Viewport,
    data_structures::{
        color::Color,
        geometry::Geometry,
        instance::Instance,
        material::{Blending, Material},
        scene_graph::{GeometryId, MaterialId, Node, NodeId, NodeKind, SceneError, SceneGraph},
    },
    demos::{digital_path::DigitalPath, earth::Earth, wire_sphere::WireSphere},
    flow::Demo,
    render::draw_order,
};

use crate::common::test_utils::{approx_eq_vec, seeded};

mod common;

struct Fixture {
    scene: SceneGraph,
    opaque: MaterialId,
    additive: MaterialId,
    geometry: GeometryId,
}

fn fixture() -> Fixture {
    let mut scene = SceneGraph::new();
    let geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
    let opaque = scene.add_material(Material::standard("solid", Color::WHITE));
    let additive = scene.add_material(
        Material::basic("glow", Color::from_hex(0x0088ff)).with_blending(Blending::Additive),
    );
    Fixture {
        scene,
        opaque,
        additive,
        geometry,
    }
}

#[test]
fn children_inherit_parent_transform() {
    let Fixture {
        mut scene,
        opaque,
        geometry,
        ..
    } = fixture();
    let parent = scene.add(Node::group("parent").with_transform(
        Instance::new()
            .with_position(Vector3::new(1.0, 0.0, 0.0))
            .with_rotation(Quaternion::from_angle_y(Deg(90.0))),
    ));
    let child = scene
        .add_child(
            parent,
            Node::mesh("child", geometry, opaque)
                .with_transform(Instance::new().with_position(Vector3::new(0.0, 0.0, 1.0))),
        )
        .unwrap();

    let world = scene.world_transform(child).unwrap();
    // +z rotated by 90 degrees about y is +x.
    assert!(approx_eq_vec(world.position, Vector3::new(2.0, 0.0, 0.0), 1e-5));

    let items = scene.draw_list();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].node, child);
    assert!(approx_eq_vec(items[0].world.position, world.position, 1e-6));
}

#[test]
fn draw_list_is_depth_first() {
    let Fixture {
        mut scene,
        opaque,
        geometry,
        ..
    } = fixture();
    let a = scene.add(Node::mesh("a", geometry, opaque));
    let b = scene.add(Node::mesh("b", geometry, opaque));
    let a1 = scene.add_child(a, Node::mesh("a1", geometry, opaque)).unwrap();
    let a2 = scene.add_child(a, Node::mesh("a2", geometry, opaque)).unwrap();
    let a1x = scene.add_child(a1, Node::mesh("a1x", geometry, opaque)).unwrap();

    let order: Vec<NodeId> = scene.draw_list().iter().map(|item| item.node).collect();
    assert_eq!(order, vec![a, a1, a1x, a2, b]);
}

#[test]
fn groups_are_not_drawn() {
    let Fixture {
        mut scene,
        opaque,
        geometry,
        ..
    } = fixture();
    let group = scene.add(Node::group("group"));
    scene.add_child(group, Node::mesh("mesh", geometry, opaque)).unwrap();
    assert_eq!(scene.draw_list().len(), 1);
    assert!(matches!(scene.node(group).unwrap().kind, NodeKind::Group));
}

#[test]
fn removing_a_node_removes_its_subtree() {
    let Fixture {
        mut scene,
        opaque,
        geometry,
        ..
    } = fixture();
    let root = scene.add(Node::group("root"));
    let child = scene.add_child(root, Node::mesh("child", geometry, opaque)).unwrap();
    let grandchild = scene.add_child(child, Node::mesh("grandchild", geometry, opaque)).unwrap();
    let sibling = scene.add(Node::mesh("sibling", geometry, opaque));

    let removed = scene.remove(child).unwrap();
    assert_eq!(removed.name, "child");
    assert!(scene.node(child).is_none());
    assert!(scene.node(grandchild).is_none());
    assert!(scene.node(root).unwrap().children().is_empty());
    assert_eq!(scene.roots(), &[root, sibling]);
    assert_eq!(scene.remove(child).unwrap_err(), SceneError::UnknownNode(child));
}

#[test]
fn unknown_parent_is_an_error() {
    let Fixture {
        mut scene,
        opaque,
        geometry,
        ..
    } = fixture();
    let missing = NodeId(42);
    assert_eq!(
        scene.add_child(missing, Node::mesh("orphan", geometry, opaque)),
        Err(SceneError::UnknownNode(missing))
    );
    assert!(scene.transform_mut(missing).is_err());
}

#[test]
fn opaque_after_blended_sibling_is_rejected() {
    let Fixture {
        mut scene,
        opaque,
        additive,
        geometry,
    } = fixture();
    let group = scene.add(Node::group("group"));
    scene.add_child(group, Node::mesh("glow", geometry, additive)).unwrap();
    scene.add_child(group, Node::mesh("surface", geometry, opaque)).unwrap();

    assert_eq!(
        scene.check_blend_order(),
        Err(SceneError::BlendOrder {
            blended: "glow".to_string(),
            opaque: "surface".to_string(),
        })
    );
}

#[test]
fn opaque_before_blended_sibling_is_accepted() {
    let Fixture {
        mut scene,
        opaque,
        additive,
        geometry,
    } = fixture();
    let group = scene.add(Node::group("group"));
    scene.add_child(group, Node::mesh("surface", geometry, opaque)).unwrap();
    scene.add_child(group, Node::mesh("glow", geometry, additive)).unwrap();
    assert_eq!(scene.check_blend_order(), Ok(()));
}

#[test]
fn draw_order_puts_opaque_first_and_keeps_traversal_order() {
    let Fixture {
        mut scene,
        opaque,
        additive,
        geometry,
    } = fixture();
    let glow = scene.add(Node::mesh("glow", geometry, additive));
    let first = scene.add(Node::mesh("first", geometry, opaque));
    let shell = scene.add(Node::mesh("shell", geometry, additive));
    let second = scene.add(Node::mesh("second", geometry, opaque));

    let order: Vec<NodeId> = draw_order(scene.draw_list())
        .iter()
        .map(|item| item.node)
        .collect();
    assert_eq!(order, vec![first, second, glow, shell]);
}

#[test]
fn texture_sources_are_distinct() {
    let mut scene = SceneGraph::new();
    scene.add_material(Material::standard("a", Color::WHITE).with_map("img/a.jpg"));
    scene.add_material(Material::basic("b", Color::WHITE).with_map("img/b.jpg"));
    scene.add_material(Material::basic("a again", Color::WHITE).with_map("img/a.jpg"));
    scene.add_material(Material::line("no map", Color::WHITE));
    assert_eq!(scene.texture_sources(), vec!["img/a.jpg", "img/b.jpg"]);
}

#[test]
fn every_demo_draws_opaque_before_blended() {
    let viewport = Viewport::new(800, 600);
    let (_, earth) = Earth::assemble(Default::default(), viewport, &mut seeded(1)).unwrap();
    let (_, sphere) = WireSphere::assemble(Default::default(), viewport, &mut seeded(2)).unwrap();
    let (_, path) = DigitalPath::assemble(Default::default(), viewport, &mut seeded(3)).unwrap();
    for stage in [earth, sphere, path] {
        assert_eq!(stage.scene.check_blend_order(), Ok(()));
    }
}
