pub mod nn;

pub use nn::{
    activation::{Activation, ActivationTypes, Transform},
    error::{ErrorKind, LossError},
    loss::{LossBinaryXent, LossFunction},
};

#[test]
fn test() {
    use ndarray::array;

    let loss = LossBinaryXent::new(Some(array![[1.0, 2.0]])).unwrap();
    let labels = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let pre_output = array![[0.3, -0.2], [1.5, 0.1], [-0.7, 2.2]];
    let mask = array![[1.0], [1.0], [0.0]];

    let (score, grad) = loss
        .compute_gradient_and_score(&labels, &pre_output, "sigmoid", Some(&mask), true)
        .unwrap();
    println!("score: {score}");
    println!("gradient: {grad}");

    assert!(score > 0.0);
    assert_eq!(grad.dim(), (3, 2));
    assert!(grad.row(2).iter().all(|&g| g == 0.0));
}
