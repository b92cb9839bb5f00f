use crate::{
    ir::{ConstValue, Function, FunctionBuilder, Type},
    test::vector_of,
};

// #1 buf = Vector(10), #2 push!(#1, 1.0), #3 return #1
pub fn escaping_buffer() -> Function {
    let mut b = FunctionBuilder::new("escaping_buffer");
    let buf = b.call(
        "Vector",
        vec![ConstValue::Int(10).into()],
        vector_of(Type::float()),
    );
    b.call(
        "push!",
        vec![buf.clone(), ConstValue::Float(1.0).into()],
        Type::nothing(),
    );
    b.ret(Some(buf));
    b.build().unwrap()
}

// #1 buf = zeros(4), #2 s = sum(#1), #3 return #2
pub fn local_sum() -> Function {
    let mut b = FunctionBuilder::new("local_sum");
    let buf = b.call(
        "zeros",
        vec![ConstValue::Int(4).into()],
        vector_of(Type::float()),
    );
    let s = b.call("sum", vec![buf], Type::float());
    b.ret(Some(s));
    b.build().unwrap()
}

// #1 c = true, #2 goto #13 unless #1, #3..#12 dead arm filler, #13 return
pub fn dead_else() -> Function {
    let mut b = FunctionBuilder::new("dead_else");
    let c = b.bool(true);
    b.branch(c, true, 13);
    for i in 0..10 {
        b.int(i);
    }
    b.ret(None);
    b.build().unwrap()
}

// area(shape) on a `Shape` receiver inside a loop: #1 area, #2 goto #1 unless flag, #3 return
pub fn area_loop() -> Function {
    let mut b = FunctionBuilder::new("area_loop");
    let shape = b.param(Type::abstract_type("Shape"));
    let flag = b.param(Type::bool());
    b.call("area", vec![shape], Type::float());
    b.branch(flag, true, 1);
    b.ret(None);
    b.build().unwrap()
}
