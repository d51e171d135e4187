use crate::ops;
use crate::test::param;
use crate::{Error, Graph, NodeId};

#[test]
fn test_tree_prints_shared_operand_once() {
    let mut graph = Graph::new();
    let (_, x) = param(&mut graph, 0, &[4, 4]);
    let factor = ops::cholesky(&mut graph, x, true).unwrap();
    let factor = graph.single(factor).unwrap();
    let root = ops::add(&mut graph, factor, factor).unwrap();

    let tree = graph.tree(root).unwrap();

    assert!(tree.starts_with("%2 f32[4,4] add(%1, %1)"));
    assert_eq!(tree.matches("cholesky(%0)").count(), 1);
    assert!(tree.contains("%1 → (see above)"));
    assert!(tree.contains("%0 f32[4,4] parameter(), index=0"));
}

#[test]
fn test_tree_marks_non_zero_outputs() {
    let mut graph = Graph::new();
    let (_, a) = param(&mut graph, 0, &[2]);
    let (_, b) = param(&mut graph, 1, &[2]);
    let pair = ops::tuple(&mut graph, [a, b]).unwrap();
    let pair = graph.single(pair).unwrap();
    let second = ops::get_tuple_element(&mut graph, pair, 1).unwrap();

    let tree = graph.tree(second).unwrap();
    assert!(tree.contains("get_tuple_element(%2), index=1"));
    assert!(tree.contains("%2 (f32[2], f32[2]) tuple(%0, %1)"));
}

#[test]
fn test_tree_of_missing_node() {
    let graph = Graph::new();
    assert_eq!(graph.tree(NodeId(0)).unwrap_err(), Error::DanglingNode { id: NodeId(0) });
}
