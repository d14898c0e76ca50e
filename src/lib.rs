pub mod configuration;

pub mod manager {
    pub mod namedobject;
    pub mod managererror;
    pub mod manager;
}

pub mod math {
    pub mod interval;
    pub mod compensatedsum;

    pub mod extrapolation {
        pub mod tableau;
        pub mod neville;
        pub mod richardson;
    }

    pub mod sequence {
        pub mod convergence;
    }
}

pub mod quadrature {
    pub mod quadratureerror;
    pub mod options;
    pub mod integrator;
    pub mod memoize;

    pub mod rule {
        pub mod midpoint;
        pub mod trapezoid;
        pub mod accelerated;
    }

    pub mod adaptive;
    pub mod substitute;
    pub mod improper;
    pub mod method;
    pub mod integral;
}
